//! Route definitions for the authkeep API

mod auth;

pub use auth::auth_routes;

use axum::{http::header, http::HeaderValue, routing::get, Router};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::handlers::health_check;
use crate::middleware::{cors_layer, security_headers};
use crate::state::AppState;

/// Assemble the full application router
///
/// `cors_allowed_origins` is the raw comma-separated list from configuration;
/// `hsts` should only be enabled when the service is reached over HTTPS.
pub fn app(state: AppState, cors_allowed_origins: Option<&str>, hsts: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(security_headers));

    let router = if hsts {
        router.layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ))
    } else {
        router
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_allowed_origins))
}
