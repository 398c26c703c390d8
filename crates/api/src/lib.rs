//! Probe HTTP API.
//!
//! Thin axum layer over the `pipeline` crate: handlers authenticate the
//! bearer, apply the route's rate-limit policy, call one service operation
//! and wrap the result in the response envelope.

pub mod auth;
pub mod client_ip;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

pub use auth::{AuthUser, Claims, TokenVerifier};
pub use client_ip::ClientIp;
pub use config::{Config, ConfigError};
pub use error::{ApiError, ApiResponse, Envelope};
pub use state::AppState;

/// The full application with state attached.
pub fn app(state: AppState) -> Router {
    routes::router(state.clone()).with_state(state)
}
