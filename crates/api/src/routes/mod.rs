//! Route handlers.

pub mod analysis;
pub mod health;
pub mod profile;
pub mod session;

use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::client_ip::ip_gate;
use crate::state::AppState;

/// Build the router with all routes.
///
/// The session routes sit behind the per-IP gate as well as their own
/// per-user limits.
pub fn router(state: AppState) -> Router<AppState> {
    let session = Router::new()
        .route("/api/auth/me", get(session::me))
        .route("/api/auth/logout", post(session::logout))
        .route_layer(middleware::from_fn_with_state(state, ip_gate));

    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Analysis
        .route("/api/analysis", post(analysis::analyze).get(analysis::list))
        .route("/api/analysis/save", post(analysis::save))
        .route("/api/analysis/ai", patch(analysis::toggle_ai))
        .route(
            "/api/analysis/:analysisId",
            get(analysis::get_one).delete(analysis::delete_one),
        )
        // Profile
        .route("/api/profile/me", get(profile::me).patch(profile::edit))
        // Session
        .merge(session)
}
