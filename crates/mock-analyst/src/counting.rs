//! Counting analyst - records how often the inner analyst was called.

use std::sync::atomic::{AtomicUsize, Ordering};

use analyst_core::{async_trait, AnalysisSubject, Analyst, AnalystError};

/// Wraps another analyst and counts calls, including failed ones.
pub struct CountingAnalyst<A: Analyst> {
    inner: A,
    calls: AtomicUsize,
}

impl<A: Analyst> CountingAnalyst<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `analyze` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<A: Analyst> Analyst for CountingAnalyst<A> {
    async fn analyze(&self, subject: &AnalysisSubject) -> Result<String, AnalystError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.analyze(subject).await
    }

    fn name(&self) -> &str {
        "CountingAnalyst"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}
