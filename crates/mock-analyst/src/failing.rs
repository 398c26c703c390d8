//! Failing analyst - every call returns an error.

use analyst_core::{async_trait, AnalysisSubject, Analyst, AnalystError};

/// An analyst whose backend is always down.
#[derive(Debug, Clone, Default)]
pub struct FailingAnalyst {
    status: Option<u16>,
}

impl FailingAnalyst {
    /// Fail with `AnalystError::Unavailable`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `AnalystError::Api` carrying `status`.
    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
        }
    }
}

#[async_trait]
impl Analyst for FailingAnalyst {
    async fn analyze(&self, _subject: &AnalysisSubject) -> Result<String, AnalystError> {
        Err(match self.status {
            Some(status) => AnalystError::Api {
                status,
                message: "mock failure".to_string(),
            },
            None => AnalystError::Unavailable("mock analyst is down".to_string()),
        })
    }

    fn name(&self) -> &str {
        "FailingAnalyst"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}
