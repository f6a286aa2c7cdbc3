//! PostgreSQL store behavior against a live database

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use futures_util::future::join_all;
    use sqlx::PgPool;
    use uuid::Uuid;

    use authkeep_server::db::run_migrations;
    use authkeep_server::models::{NewSession, NewUser};
    use authkeep_server::store::{PgSessionStore, PgUserStore, SessionStore, StoreError, UserStore};

    /// Helper to create a migrated test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/authkeep_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(4)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$2b$04$not-a-real-hash".to_string(),
            email: format!("{}@example.com", username),
            display_name: "Test User".to_string(),
        }
    }

    fn unique_username() -> String {
        format!("user_{}", Uuid::new_v4().simple())
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_duplicate_username_conflicts() {
        let users = PgUserStore::new(setup_test_db().await);
        let username = unique_username();

        users.create(new_user(&username)).await.unwrap();
        let err = users.create(new_user(&username)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let found = users.find_by_username(&username).await.unwrap().unwrap();
        assert_eq!(found.username, username);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_concurrent_creates_single_winner() {
        let users = PgUserStore::new(setup_test_db().await);
        let username = unique_username();

        let results = join_all((0..8).map(|_| users.create(new_user(&username)))).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, StoreError::Conflict)));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_session_lifecycle() {
        let pool = setup_test_db().await;
        let users = PgUserStore::new(pool.clone());
        let sessions = PgSessionStore::new(pool);

        let user = users.create(new_user(&unique_username())).await.unwrap();
        let token = Uuid::new_v4().to_string();

        let session = sessions
            .create(NewSession {
                user_id: user.id,
                refresh_token: token.clone(),
                expires_at: Utc::now() + Duration::days(1),
            })
            .await
            .unwrap();
        assert_ne!(session.token_hash, token);

        assert!(sessions.find_by_token(&token).await.unwrap().is_some());

        let replacement = NewSession {
            user_id: user.id,
            refresh_token: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + Duration::days(1),
        };
        let new_token = replacement.refresh_token.clone();
        assert!(sessions
            .rotate(&token, replacement.clone())
            .await
            .unwrap()
            .is_some());
        assert!(sessions.rotate(&token, replacement).await.unwrap().is_none());
        assert!(sessions.find_by_token(&token).await.unwrap().is_none());
        assert!(sessions.find_by_token(&new_token).await.unwrap().is_some());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_expired_session_not_found() {
        let pool = setup_test_db().await;
        let users = PgUserStore::new(pool.clone());
        let sessions = PgSessionStore::new(pool);

        let user = users.create(new_user(&unique_username())).await.unwrap();
        let token = Uuid::new_v4().to_string();

        sessions
            .create(NewSession {
                user_id: user.id,
                refresh_token: token.clone(),
                expires_at: Utc::now() - Duration::seconds(1),
            })
            .await
            .unwrap();

        assert!(sessions.find_by_token(&token).await.unwrap().is_none());
        let replacement = NewSession {
            user_id: user.id,
            refresh_token: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + Duration::days(1),
        };
        assert!(sessions.rotate(&token, replacement).await.unwrap().is_none());
        assert!(sessions.delete_expired().await.unwrap() >= 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_failed_rotate_rolls_back() {
        let pool = setup_test_db().await;
        let users = PgUserStore::new(pool.clone());
        let sessions = PgSessionStore::new(pool);

        let user = users.create(new_user(&unique_username())).await.unwrap();
        let old_token = Uuid::new_v4().to_string();
        let taken_token = Uuid::new_v4().to_string();
        for token in [&old_token, &taken_token] {
            sessions
                .create(NewSession {
                    user_id: user.id,
                    refresh_token: token.clone(),
                    expires_at: Utc::now() + Duration::days(1),
                })
                .await
                .unwrap();
        }

        // The insert hits the token_hash unique constraint after the delete ran
        let err = sessions
            .rotate(
                &old_token,
                NewSession {
                    user_id: user.id,
                    refresh_token: taken_token,
                    expires_at: Utc::now() + Duration::days(1),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert!(sessions.find_by_token(&old_token).await.unwrap().is_some());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_delete_for_user() {
        let pool = setup_test_db().await;
        let users = PgUserStore::new(pool.clone());
        let sessions = PgSessionStore::new(pool);

        let user = users.create(new_user(&unique_username())).await.unwrap();
        for _ in 0..3 {
            sessions
                .create(NewSession {
                    user_id: user.id,
                    refresh_token: Uuid::new_v4().to_string(),
                    expires_at: Utc::now() + Duration::days(1),
                })
                .await
                .unwrap();
        }

        assert_eq!(sessions.delete_for_user(user.id).await.unwrap(), 3);
        assert_eq!(sessions.delete_for_user(user.id).await.unwrap(), 0);
    }
}
