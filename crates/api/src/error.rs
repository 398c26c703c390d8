//! Response envelope and error mapping.
//!
//! Every response body has the shape
//! `{success, message, data?, error?: {code, statusCode, details?}}`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pipeline::{ErrorCode, PipelineError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

/// Error body inside the envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// The response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// A successful response.
pub struct ApiResponse<T: Serialize> {
    status: StatusCode,
    message: String,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with data.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: Some(data),
        }
    }

    /// 201 with data.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// 200 without data.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            success: true,
            message: self.message,
            data: self.data,
            error: None,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Errors surfaced by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, invalid or expired access token.
    #[error("{0}")]
    Unauthorized(String),

    /// Request shape rejected before any work was done.
    #[error("{0}")]
    Validation(String),

    /// The caller used up its rate-limit window.
    #[error("Too many requests, please try again later")]
    RateLimited,

    /// A domain operation failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<database::ValidationError> for ApiError {
    fn from(err: database::ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

fn message_for(err: &PipelineError) -> String {
    match err {
        PipelineError::NotFound { entity, .. } => format!("{} was not found", entity),
        PipelineError::Validation(msg) => msg.clone(),
        PipelineError::Fetch(e) => e.to_string(),
        PipelineError::Analysis { .. } => "An error occurred while analyzing the response".to_string(),
        PipelineError::Database(_) | PipelineError::Cache(_) => {
            "A server error occurred, please try again shortly".to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message, details, data) = match self {
            ApiError::Unauthorized(msg) => (ErrorCode::AuthenticationError, msg, None, None),
            ApiError::Validation(msg) => (
                ErrorCode::ValidationError,
                "Invalid request".to_string(),
                Some(msg),
                None,
            ),
            ApiError::RateLimited => (
                ErrorCode::RateLimitExceeded,
                ApiError::RateLimited.to_string(),
                None,
                None,
            ),
            ApiError::Pipeline(err) => {
                if err.is_internal() {
                    error!(error = %err, "Request failed");
                } else {
                    warn!(code = %err.code(), error = %err, "Request rejected");
                }
                let message = message_for(&err);
                let code = err.code();
                let data = match err {
                    PipelineError::Analysis { outcome, .. } => serde_json::to_value(*outcome).ok(),
                    _ => None,
                };
                (code, message, None, data)
            }
        };

        let status =
            StatusCode::from_u16(code.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Envelope<Value> = Envelope {
            success: false,
            message,
            data,
            error: Some(ErrorBody {
                code,
                status_code: status.as_u16(),
                details,
            }),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for route handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::FetchError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::RateLimited.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Unauthorized("no token".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Validation("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );

        let no_response = PipelineError::Fetch(FetchError::NoResponse("refused".into()));
        assert_eq!(
            ApiError::from(no_response).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_envelope_omits_empty_fields() {
        let body = Envelope::<()> {
            success: true,
            message: "done".to_string(),
            data: None,
            error: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"success": true, "message": "done"})
        );
    }
}
