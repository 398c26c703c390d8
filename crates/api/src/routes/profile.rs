//! Profile routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use pipeline::{Policy, ProfileEdit, ProfileSnapshot};

use crate::auth::AuthUser;
use crate::error::{ApiResponse, Result};
use crate::state::AppState;

/// `GET /api/profile/me`
pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<ApiResponse<ProfileSnapshot>> {
    let profile = state.profiles.get_profile(&user.user_id).await?;
    Ok(ApiResponse::ok("Profile information successfully fetched", profile))
}

/// `PATCH /api/profile/me`
pub async fn edit(
    State(state): State<AppState>,
    user: AuthUser,
    payload: std::result::Result<Json<ProfileEdit>, JsonRejection>,
) -> Result<ApiResponse<ProfileSnapshot>> {
    state.enforce(&user.user_id, &Policy::USER_ACTION).await?;

    let Json(edit) = payload?;
    let profile = state.profiles.edit_profile(&user.user_id, &edit).await?;
    Ok(ApiResponse::ok("Profile information successfully updated", profile))
}
