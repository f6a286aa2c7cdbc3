//! Background purge of expired sessions
//!
//! Lookups already ignore expired sessions; the sweep only keeps the table small.

use std::sync::Arc;
use std::time::Duration;

use super::AuthService;

/// Run forever, purging expired sessions every `interval`
pub async fn session_sweeper(auth_service: Arc<AuthService>, interval: Duration) {
    tracing::info!(interval_secs = interval.as_secs(), "Starting session sweeper");

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; skip it so startup is not slowed by a sweep
    ticker.tick().await;

    loop {
        ticker.tick().await;

        match auth_service.purge_expired_sessions().await {
            Ok(0) => {}
            Ok(purged) => tracing::info!(purged, "Purged expired sessions"),
            Err(e) => tracing::error!("Error purging expired sessions: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PasswordHasher, TokenSigner};
    use crate::config::RefreshRotation;
    use crate::models::NewSession;
    use crate::store::{InMemorySessionStore, InMemoryUserStore, SessionStore};
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_sweeper_purges_expired_sessions() {
        let sessions = InMemorySessionStore::new();
        let service = Arc::new(AuthService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(sessions.clone()),
            PasswordHasher::new(4),
            TokenSigner::new("sweeper-secret", 60),
            chrono::Duration::days(14),
            RefreshRotation::Rotate,
        ));

        sessions
            .create(NewSession {
                user_id: Uuid::new_v4(),
                refresh_token: "expired".to_string(),
                expires_at: Utc::now() - chrono::Duration::seconds(5),
            })
            .await
            .unwrap();

        let handle = tokio::spawn(session_sweeper(service, Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();

        assert!(sessions.is_empty().await);
    }
}
