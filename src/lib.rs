//! authkeep server library
//!
//! Credential and session service: account registration, password login, and a
//! two-token session model (short-lived access token, persisted refresh token).

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
