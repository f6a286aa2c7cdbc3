//! Postgres pool for the credential and session stores

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

/// Bounds how long a request waits for a connection before it fails with a 500
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Failed to apply migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Open the pool and bring the schema up to date
pub async fn connect(config: &Config) -> Result<PgPool, DbError> {
    let url = config.database_url_masked();
    tracing::info!(url = %url, max_connections = config.db_max_connections, "Connecting to store");

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .map_err(|e| DbError::Connect {
            url,
            reason: e.to_string(),
        })?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Apply pending migrations from `migrations/`
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("users and sessions schema is current");
    Ok(())
}
