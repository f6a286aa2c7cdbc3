//! In-memory stores
//!
//! Used for local development (`STORE_BACKEND=memory`) and tests. Each map sits
//! behind a single `RwLock`, so check-then-insert runs under one write guard.

use async_trait::async_trait;
use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SessionStore, StoreError, UserStore};
use crate::auth::hash_refresh_token;
use crate::models::{NewSession, NewUser, Session, User};

/// Users keyed by username
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if users.contains_key(&user.username) {
            return Err(StoreError::Conflict);
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            display_name: user.display_name,
            created_at: Utc::now(),
        };
        users.insert(created.username.clone(), created.clone());

        Ok(created)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Sessions keyed by refresh token hash
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: NewSession) -> Result<Session, StoreError> {
        let token_hash = hash_refresh_token(&session.refresh_token);
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&token_hash) {
            return Err(StoreError::Conflict);
        }

        let created = Session {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            token_hash: token_hash.clone(),
            expires_at: session.expires_at,
            created_at: Utc::now(),
        };
        sessions.insert(token_hash, created.clone());

        Ok(created)
    }

    async fn find_by_token(&self, refresh_token: &str) -> Result<Option<Session>, StoreError> {
        let token_hash = hash_refresh_token(refresh_token);
        let now = Utc::now();

        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&token_hash)
            .filter(|s| s.is_active_at(now))
            .cloned())
    }

    async fn rotate(
        &self,
        refresh_token: &str,
        replacement: NewSession,
    ) -> Result<Option<Session>, StoreError> {
        let old_hash = hash_refresh_token(refresh_token);
        let new_hash = hash_refresh_token(&replacement.refresh_token);
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;

        let live = sessions
            .get(&old_hash)
            .is_some_and(|s| s.is_active_at(now) && s.user_id == replacement.user_id);
        if !live {
            return Ok(None);
        }
        if sessions.contains_key(&new_hash) {
            return Err(StoreError::Conflict);
        }

        sessions.remove(&old_hash);
        let created = Session {
            id: Uuid::new_v4(),
            user_id: replacement.user_id,
            token_hash: new_hash.clone(),
            expires_at: replacement.expires_at,
            created_at: now,
        };
        sessions.insert(new_hash, created.clone());

        Ok(Some(created))
    }

    async fn delete(&self, refresh_token: &str) -> Result<(), StoreError> {
        let token_hash = hash_refresh_token(refresh_token);
        self.sessions.write().await.remove(&token_hash);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.is_active_at(now));
        Ok((before - sessions.len()) as u64)
    }
}
