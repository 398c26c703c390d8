//! Analysis routes: run, save, list, read, delete, toggle.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use database::validation;
use database::AnalysisRecord;
use pipeline::{
    AnalysisOutcome, AnalysisPage, ListQuery, OutboundRequest, OutcomeInfo, Policy,
    ProfileSnapshot, SaveAnalysis,
};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResponse, Result};
use crate::state::AppState;

fn check_record_id(id: &str) -> Result<()> {
    uuid::Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ApiError::Validation(format!("invalid analysis id: {}", id)))
}

/// `POST /api/analysis`: send the request, analyze the response, charge.
pub async fn analyze(
    State(state): State<AppState>,
    user: AuthUser,
    payload: std::result::Result<Json<OutboundRequest>, JsonRejection>,
) -> Result<ApiResponse<AnalysisOutcome>> {
    state.enforce(&user.user_id, &Policy::USER_ACTION).await?;

    let Json(mut request) = payload?;
    request.method = validation::validate_method(&request.method)?.to_string();
    validation::validate_endpoint(&request.endpoint)?;

    let outcome = state.pipeline.run(&user.user_id, &request).await?;
    let message = match outcome.info {
        Some(OutcomeInfo::AiDisabled) => "Request successful (AI disabled)",
        Some(OutcomeInfo::InsufficientCredits) => {
            "Request successful (no AI due to insufficient credits)"
        }
        _ => "Endpoint successfully analyzed",
    };
    info!(
        user_id = %user.user_id,
        status = outcome.response.status,
        cost = outcome.cost,
        info = outcome.info.map_or("charged", |info| info.as_str()),
        "Endpoint analyzed"
    );
    Ok(ApiResponse::ok(message, outcome))
}

/// `POST /api/analysis/save`
pub async fn save(
    State(state): State<AppState>,
    user: AuthUser,
    payload: std::result::Result<Json<SaveAnalysis>, JsonRejection>,
) -> Result<ApiResponse<AnalysisRecord>> {
    state.enforce(&user.user_id, &Policy::USER_ACTION).await?;

    let Json(input) = payload?;
    let record = state.records.save(&user.user_id, input).await?;
    Ok(ApiResponse::created("Request has been successfully saved", record))
}

/// `GET /api/analysis`
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<ApiResponse<AnalysisPage>> {
    let Query(query) = query?;
    let page = state.records.list(&user.user_id, &query).await?;
    Ok(ApiResponse::ok("Saved analysis fetched successfully", page))
}

/// `GET /api/analysis/:analysisId`
pub async fn get_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(analysis_id): Path<String>,
) -> Result<ApiResponse<AnalysisRecord>> {
    state.enforce(&user.user_id, &Policy::USER_ACTION).await?;
    check_record_id(&analysis_id)?;

    let record = state.records.get(&user.user_id, &analysis_id).await?;
    Ok(ApiResponse::ok(
        "Requested analysis details have been fetched successfully",
        record,
    ))
}

/// `DELETE /api/analysis/:analysisId`
pub async fn delete_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(analysis_id): Path<String>,
) -> Result<ApiResponse<()>> {
    state.enforce(&user.user_id, &Policy::USER_ACTION).await?;
    check_record_id(&analysis_id)?;

    state.records.delete(&user.user_id, &analysis_id).await?;
    Ok(ApiResponse::message("Request has been successfully deleted"))
}

/// `PATCH /api/analysis/ai`
pub async fn toggle_ai(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<ProfileSnapshot>> {
    state.enforce(&user.user_id, &Policy::USER_ACTION).await?;

    let profile = state.profiles.toggle_ai_analysis(&user.user_id).await?;
    let message = format!(
        "AI analysis has been successfully {}",
        if profile.enable_ai_analysis { "enabled" } else { "disabled" }
    );
    Ok(ApiResponse::ok(message, profile))
}
