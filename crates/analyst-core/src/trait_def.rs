//! The Analyst trait definition.

use async_trait::async_trait;

use crate::error::AnalystError;
use crate::subject::AnalysisSubject;

/// Explains a fetched HTTP response in plain text.
///
/// This trait is object-safe and is normally held as `Arc<dyn Analyst>`.
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Analyze one response.
    ///
    /// # Returns
    ///
    /// The analysis text, or an error if the backend failed. Errors are
    /// values; implementations must not panic on backend failures.
    async fn analyze(&self, subject: &AnalysisSubject) -> Result<String, AnalystError>;

    /// Get a human-readable name for this analyst.
    fn name(&self) -> &str;

    /// Check if the analyst is ready to take requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}
