//! Session routes for the token bearer.

use axum::extract::State;
use pipeline::{AuthState, Policy};

use crate::auth::AuthUser;
use crate::error::{ApiResponse, Result};
use crate::state::AppState;

/// `GET /api/auth/me`
pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<ApiResponse<AuthState>> {
    let auth = state.profiles.auth_state(&user.user_id).await?;
    Ok(ApiResponse::ok("Authentication data successfully fetched", auth))
}

/// `POST /api/auth/logout`
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> Result<ApiResponse<()>> {
    state.enforce(&user.user_id, &Policy::USER_LOGOUT).await?;

    state.profiles.logout(&user.user_id).await?;
    Ok(ApiResponse::message("Logged out successfully"))
}
