//! PostgreSQL-backed stores
//!
//! Schema lives in `migrations/`. `users.username` and `sessions.token_hash`
//! carry UNIQUE constraints; violations surface as [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{SessionStore, StoreError, UserStore};
use crate::auth::hash_refresh_token;
use crate::models::{NewSession, NewUser, Session, User};

#[derive(Clone)]
pub struct PgUserStore {
    db_pool: PgPool,
}

impl PgUserStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, email, display_name, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, email, display_name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO users (id, username, password_hash, email, display_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, password_hash, email, display_name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(created)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db_pool).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgSessionStore {
    db_pool: PgPool,
}

impl PgSessionStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: NewSession) -> Result<Session, StoreError> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session.user_id)
        .bind(hash_refresh_token(&session.refresh_token))
        .bind(session.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(created)
    }

    async fn find_by_token(&self, refresh_token: &str) -> Result<Option<Session>, StoreError> {
        // Expiry is compared against the application clock, same as the in-memory store
        let session = sqlx::query_as(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM sessions
            WHERE token_hash = $1 AND expires_at > $2
            "#,
        )
        .bind(hash_refresh_token(refresh_token))
        .bind(Utc::now())
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(session)
    }

    async fn rotate(
        &self,
        refresh_token: &str,
        replacement: NewSession,
    ) -> Result<Option<Session>, StoreError> {
        let now = Utc::now();
        // Dropping the transaction on any early return rolls the delete back
        let mut tx = self.db_pool.begin().await?;

        // Concurrent rotations of one token serialize on the row; only one deletes it
        let removed: Option<(Uuid,)> = sqlx::query_as(
            r#"
            DELETE FROM sessions
            WHERE token_hash = $1 AND user_id = $2 AND expires_at > $3
            RETURNING id
            "#,
        )
        .bind(hash_refresh_token(refresh_token))
        .bind(replacement.user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        if removed.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let created = sqlx::query_as(
            r#"
            INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(replacement.user_id)
        .bind(hash_refresh_token(&replacement.refresh_token))
        .bind(replacement.expires_at)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(created))
    }

    async fn delete(&self, refresh_token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_refresh_token(refresh_token))
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let rows_affected = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let rows_affected = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
