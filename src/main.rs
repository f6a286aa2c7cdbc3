//! authkeep server
//!
//! Issues and validates user credentials: registration, sign-in, access-token
//! refresh and sign-out over HTTP.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use authkeep_server::auth::{session_sweeper, AuthService};
use authkeep_server::config::{Config, StoreBackend};
use authkeep_server::db;
use authkeep_server::routes;
use authkeep_server::state::AppState;
use authkeep_server::store::{
    InMemorySessionStore, InMemoryUserStore, PgSessionStore, PgUserStore, SessionStore, UserStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        store = ?config.store_backend,
        rotation = ?config.refresh_rotation,
        "Starting authkeep server"
    );

    let (users, sessions): (Arc<dyn UserStore>, Arc<dyn SessionStore>) =
        match config.store_backend {
            StoreBackend::Postgres => {
                let db_pool = db::connect(&config)
                    .await
                    .context("Failed to initialize database")?;

                (
                    Arc::new(PgUserStore::new(db_pool.clone())),
                    Arc::new(PgSessionStore::new(db_pool)),
                )
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; accounts and sessions are lost on restart");
                (
                    Arc::new(InMemoryUserStore::new()),
                    Arc::new(InMemorySessionStore::new()),
                )
            }
        };

    let auth_service = Arc::new(AuthService::from_config(users, sessions, &config));

    // Start session sweeper in background
    let sweeper_service = auth_service.clone();
    let sweep_interval = Duration::from_secs(config.session_sweep_interval_seconds);
    tokio::spawn(async move {
        session_sweeper(sweeper_service, sweep_interval).await;
        tracing::error!("Session sweeper task exited unexpectedly");
    });

    let app = routes::app(
        AppState::new(auth_service),
        config.cors_allowed_origins.as_deref(),
        config.environment.is_production(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
