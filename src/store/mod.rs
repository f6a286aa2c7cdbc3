//! Persistence for users and sessions
//!
//! The auth service talks to storage only through [`UserStore`] and
//! [`SessionStore`]. Uniqueness of usernames and refresh tokens is enforced by
//! the store itself, never by a check in the caller.

mod memory;
mod postgres;

pub use memory::{InMemorySessionStore, InMemoryUserStore};
pub use postgres::{PgSessionStore, PgUserStore};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewSession, NewUser, Session, User};

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated")]
    Conflict,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Database(e.to_string()),
        }
    }
}

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Insert a user; fails with [`StoreError::Conflict`] if the username is taken
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Cheap connectivity check for health reporting
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Refresh-token session store
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: NewSession) -> Result<Session, StoreError>;

    /// Look up a session by its raw refresh token
    ///
    /// Returns `None` both when no session exists and when it has expired.
    async fn find_by_token(&self, refresh_token: &str) -> Result<Option<Session>, StoreError>;

    /// Replace the live session behind `refresh_token` with `replacement`
    ///
    /// Removal and insertion commit together: if the insert fails the old session
    /// is still usable. Returns the new session, or `None` without touching
    /// anything when the token has no live session owned by `replacement.user_id`.
    /// Of several concurrent callers rotating the same token, at most one succeeds.
    async fn rotate(
        &self,
        refresh_token: &str,
        replacement: NewSession,
    ) -> Result<Option<Session>, StoreError>;

    /// Delete the session for a refresh token; deleting an unknown token is not an error
    async fn delete(&self, refresh_token: &str) -> Result<(), StoreError>;

    /// Delete every session belonging to a user, returning how many were removed
    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Purge sessions whose expiry has passed, returning how many were removed
    async fn delete_expired(&self) -> Result<u64, StoreError>;
}
