//! Opaque refresh tokens

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes in a refresh token
pub const REFRESH_TOKEN_BYTES: usize = 64;

/// Generate a refresh token from the operating system's CSPRNG
///
/// The token is rendered as lowercase hex, so it is twice as long as
/// [`REFRESH_TOKEN_BYTES`].
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a refresh token for storage
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
