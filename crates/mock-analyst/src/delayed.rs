//! Delayed analyst - wraps another analyst with artificial latency.

use std::time::Duration;

use analyst_core::{async_trait, AnalysisSubject, Analyst, AnalystError};
use tokio::time::sleep;

/// An analyst that sleeps before delegating.
///
/// Useful for widening the window between the credit check and the charge.
pub struct DelayedAnalyst<A: Analyst> {
    inner: A,
    delay: Duration,
}

impl<A: Analyst> DelayedAnalyst<A> {
    pub fn new(inner: A, delay: Duration) -> Self {
        Self { inner, delay }
    }

    pub fn with_millis(inner: A, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<A: Analyst> Analyst for DelayedAnalyst<A> {
    async fn analyze(&self, subject: &AnalysisSubject) -> Result<String, AnalystError> {
        sleep(self.delay).await;
        self.inner.analyze(subject).await
    }

    fn name(&self) -> &str {
        "DelayedAnalyst"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CannedAnalyst;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delayed_analyst() {
        let analyst = DelayedAnalyst::with_millis(CannedAnalyst::new("late"), 50);
        let subject = AnalysisSubject::new("http://x.io", 200, Default::default(), Default::default());

        let start = Instant::now();
        let text = analyst.analyze(&subject).await.unwrap();

        assert_eq!(text, "late");
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(analyst.name(), "DelayedAnalyst");
    }
}
