//! Authentication module
//!
//! Username/password authentication with a two-token session model.
//! - bcrypt password hashing
//! - Short-lived JWT access tokens
//! - Long-lived opaque refresh tokens persisted as sessions, delivered by cookie

pub mod cookie;
mod jwt;
mod password;
mod refresh;
mod service;
mod sweeper;

pub use jwt::{Claims, TokenError, TokenSigner};
pub use password::{PasswordError, PasswordHasher, MAX_PASSWORD_BYTES};
pub use refresh::{generate_refresh_token, hash_refresh_token, REFRESH_TOKEN_BYTES};
pub use service::{AuthError, AuthService, IssuedSession, RefreshedSession, RotatedRefreshToken};
pub use sweeper::session_sweeper;
