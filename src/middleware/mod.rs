//! Middleware for the authkeep API
//!
//! Bearer-token authentication plus the response-header and tracing layers
//! applied to every route.

pub mod auth;
mod layers;

pub use auth::AuthenticatedUser;
pub use layers::{cors_layer, security_headers};
