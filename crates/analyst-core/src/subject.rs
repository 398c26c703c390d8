//! The response handed to an analyst.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fetched HTTP response plus the URL it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSubject {
    /// The requested endpoint.
    pub url: String,
    /// Upstream status code.
    pub status: u16,
    /// Response headers as a JSON object.
    pub headers: Value,
    /// Response body: parsed JSON when it parsed, else a JSON string.
    pub body: Value,
}

impl AnalysisSubject {
    pub fn new(url: impl Into<String>, status: u16, headers: Value, body: Value) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body,
        }
    }
}
