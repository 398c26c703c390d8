//! Error taxonomy shared by every Probe operation.

use analyst_core::AnalystError;
use cache_store::CacheError;
use database::DatabaseError;
use serde::Serialize;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::pipeline::AnalysisOutcome;

/// Stable, caller-visible error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    AuthenticationError,
    ValidationError,
    RateLimitExceeded,
    NoResponse,
    SetupError,
    InternalServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AuthenticationError => "AUTHENTICATION_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::NoResponse => "NO_RESPONSE",
            ErrorCode::SetupError => "SETUP_ERROR",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    /// HTTP status normally paired with this code.
    ///
    /// `AUTHENTICATION_ERROR` is 401 here; a caller may pair it with 400
    /// for malformed credentials.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::AuthenticationError => 401,
            ErrorCode::ValidationError => 400,
            ErrorCode::RateLimitExceeded => 429,
            ErrorCode::NoResponse => 502,
            ErrorCode::SetupError | ErrorCode::InternalServerError => 500,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the ledger, the pipeline and the record services.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A referenced account or record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input was rejected before any side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The outbound request failed before a response arrived.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The analyst failed after the fetch succeeded. Nothing was charged.
    #[error("analysis failed: {source}")]
    Analysis {
        #[source]
        source: AnalystError,
        /// The fetched exchange, tagged `analysis_error`.
        outcome: Box<AnalysisOutcome>,
    },

    /// Persistence failed.
    #[error("database error: {0}")]
    Database(DatabaseError),

    /// Cache invalidation failed.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

impl From<DatabaseError> for PipelineError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, id } => PipelineError::NotFound { entity, id },
            other => PipelineError::Database(other),
        }
    }
}

impl From<database::ValidationError> for PipelineError {
    fn from(err: database::ValidationError) -> Self {
        PipelineError::Validation(err.to_string())
    }
}

impl PipelineError {
    /// The caller-visible code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::NotFound { .. } => ErrorCode::NotFound,
            PipelineError::Validation(_) => ErrorCode::ValidationError,
            PipelineError::Fetch(FetchError::NoResponse(_)) => ErrorCode::NoResponse,
            PipelineError::Fetch(FetchError::Setup(_)) => ErrorCode::SetupError,
            PipelineError::Analysis { .. }
            | PipelineError::Database(_)
            | PipelineError::Cache(_) => ErrorCode::InternalServerError,
        }
    }

    /// The HTTP status for this error.
    pub fn status_code(&self) -> u16 {
        self.code().status_code()
    }

    /// Whether this is an unexpected failure that should be logged as an error.
    pub fn is_internal(&self) -> bool {
        self.code() == ErrorCode::InternalServerError
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
