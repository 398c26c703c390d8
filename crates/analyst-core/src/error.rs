//! Error types for analyst operations.

use thiserror::Error;

/// Errors that can occur while analyzing a response.
#[derive(Debug, Error)]
pub enum AnalystError {
    /// The analyst is misconfigured (missing key, bad client settings).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The analyst backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered with something unreadable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The call did not finish in time.
    #[error("analysis timed out")]
    Timeout,

    /// The analyst is temporarily unavailable.
    #[error("analyst unavailable: {0}")]
    Unavailable(String),
}
