//! Canned analyst - returns the same text for every response.

use analyst_core::{async_trait, AnalysisSubject, Analyst, AnalystError};

/// An analyst that always returns a fixed text.
#[derive(Debug, Clone)]
pub struct CannedAnalyst {
    text: String,
}

impl CannedAnalyst {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for CannedAnalyst {
    fn default() -> Self {
        Self::new("Mock analysis")
    }
}

#[async_trait]
impl Analyst for CannedAnalyst {
    async fn analyze(&self, _subject: &AnalysisSubject) -> Result<String, AnalystError> {
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "CannedAnalyst"
    }
}
