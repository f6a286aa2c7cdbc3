//! Authentication service
//!
//! Core business logic for registration, login and the refresh-token session
//! lifecycle. HTTP concerns (cookies, status codes) live in the handlers.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use uuid::Uuid;
use validator::Validate;

use crate::config::{Config, RefreshRotation};
use crate::models::{LoginRequest, NewSession, NewUser, RegisterRequest, User};
use crate::store::{SessionStore, StoreError, UserStore};

use super::jwt::{TokenError, TokenSigner};
use super::password::{PasswordError, PasswordHasher, MAX_PASSWORD_BYTES};
use super::refresh::generate_refresh_token;

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0} cannot be missing")]
    MissingFields(&'static str),

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Invalid access token: {0}")]
    InvalidAccessToken(TokenError),

    #[error("User not found")]
    UserNotFound,

    #[error("Password must be at most 72 bytes")]
    PasswordTooLong,

    #[error("Session expiry out of range")]
    ExpiryOutOfRange,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Tokens handed out by a successful login
#[derive(Debug)]
pub struct IssuedSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Result of a refresh; `rotated` is set when a new refresh token replaced the old one
#[derive(Debug)]
pub struct RefreshedSession {
    pub user_id: Uuid,
    pub access_token: String,
    pub rotated: Option<RotatedRefreshToken>,
}

#[derive(Debug)]
pub struct RotatedRefreshToken {
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: PasswordHasher,
    signer: TokenSigner,
    refresh_token_ttl: Duration,
    rotation: RefreshRotation,
    // Verified against when the username is unknown, so both failure paths cost one bcrypt run
    dummy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: PasswordHasher,
        signer: TokenSigner,
        refresh_token_ttl: Duration,
        rotation: RefreshRotation,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            signer,
            refresh_token_ttl,
            rotation,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Build the service from startup configuration
    pub fn from_config(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        config: &Config,
    ) -> Self {
        Self::new(
            users,
            sessions,
            PasswordHasher::new(config.bcrypt_cost),
            TokenSigner::new(&config.jwt_secret, config.access_token_ttl_seconds),
            Duration::try_days(config.refresh_token_ttl_days).unwrap_or(Duration::MAX),
            config.refresh_rotation,
        )
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }

    pub fn rotation(&self) -> RefreshRotation {
        self.rotation
    }

    /// Register a new account
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AuthError> {
        req.validate().map_err(|_| {
            AuthError::MissingFields("username, password, email, firstName, lastName")
        })?;
        check_password_length(&req.password)?;

        // Advisory only; the store's uniqueness constraint decides races
        if self.users.find_by_username(&req.username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = self.hasher.hash(&req.password).await?;

        let user = self
            .users
            .create(NewUser {
                display_name: req.display_name(),
                username: req.username,
                password_hash,
                email: req.email,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict => AuthError::UsernameTaken,
                other => AuthError::Store(other),
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Verify credentials and open a new session
    pub async fn login(&self, req: LoginRequest) -> Result<IssuedSession, AuthError> {
        req.validate()
            .map_err(|_| AuthError::MissingFields("username, password"))?;
        check_password_length(&req.password)?;

        let user = match self.users.find_by_username(&req.username).await? {
            Some(user) => user,
            None => {
                self.burn_verification(&req.password).await;
                tracing::info!(username = %req.username, "Login rejected: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(&req.password, &user.password_hash).await {
            tracing::info!(user_id = %user.id, "Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .signer
            .issue_access_token(user.id)
            .map_err(AuthError::Token)?;
        let (refresh_token, refresh_expires_at) = self.open_session(user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(IssuedSession {
            user,
            access_token,
            refresh_token,
            refresh_expires_at,
        })
    }

    /// Mint a new access token from a refresh token
    ///
    /// Under [`RefreshRotation::Rotate`] the presented token is swapped for a new
    /// one in a single store operation, after the access token has been signed.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedSession, AuthError> {
        let session = self
            .sessions
            .find_by_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidSession)?;

        let access_token = self
            .signer
            .issue_access_token(session.user_id)
            .map_err(AuthError::Token)?;

        let rotated = match self.rotation {
            RefreshRotation::Rotate => {
                let replacement = generate_refresh_token();
                let expires_at = self.session_expiry()?;

                // A concurrent refresh may have rotated the token since the lookup
                self.sessions
                    .rotate(
                        refresh_token,
                        NewSession {
                            user_id: session.user_id,
                            refresh_token: replacement.clone(),
                            expires_at,
                        },
                    )
                    .await?
                    .ok_or(AuthError::InvalidSession)?;

                Some(RotatedRefreshToken {
                    refresh_token: replacement,
                    expires_at,
                })
            }
            RefreshRotation::Reuse => None,
        };

        tracing::debug!(
            user_id = %session.user_id,
            rotated = rotated.is_some(),
            "Access token refreshed"
        );

        Ok(RefreshedSession {
            user_id: session.user_id,
            access_token,
            rotated,
        })
    }

    /// End the session behind a refresh token; unknown tokens are ignored
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.sessions.delete(refresh_token).await?;
        Ok(())
    }

    /// End every session of a user
    pub async fn logout_all(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let revoked = self.sessions.delete_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "All sessions revoked");
        Ok(revoked)
    }

    /// Resolve an access token to the user id it asserts
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid, AuthError> {
        self.signer
            .verify_access_token(access_token)
            .map_err(AuthError::InvalidAccessToken)
    }

    /// Load the user behind an authenticated request
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Remove sessions past their expiry
    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        Ok(self.sessions.delete_expired().await?)
    }

    /// Whether the backing store answers
    pub async fn store_healthy(&self) -> bool {
        self.users.ping().await.is_ok()
    }

    async fn open_session(&self, user_id: Uuid) -> Result<(String, DateTime<Utc>), AuthError> {
        let refresh_token = generate_refresh_token();
        let expires_at = self.session_expiry()?;

        self.sessions
            .create(NewSession {
                user_id,
                refresh_token: refresh_token.clone(),
                expires_at,
            })
            .await?;

        Ok((refresh_token, expires_at))
    }

    fn session_expiry(&self) -> Result<DateTime<Utc>, AuthError> {
        Utc::now()
            .checked_add_signed(self.refresh_token_ttl)
            .ok_or(AuthError::ExpiryOutOfRange)
    }

    async fn burn_verification(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.hasher.hash("authkeep-dummy-password"))
            .await;

        if let Ok(hash) = dummy {
            let _ = self.hasher.verify(password, hash).await;
        }
    }
}

/// bcrypt only reads the first 72 bytes, so longer passwords are refused outright
fn check_password_length(password: &str) -> Result<(), AuthError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::PasswordTooLong);
    }
    Ok(())
}
