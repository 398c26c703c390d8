//! Application state shared across handlers.

use std::sync::Arc;

use analyst_core::Analyst;
use cache_store::CacheStore;
use database::Database;
use pipeline::{
    AnalysisPipeline, Clock, CreditLedger, Fetcher, Policy, ProfileService, RateLimiter,
    RecordService,
};

use crate::auth::TokenVerifier;
use crate::error::{ApiError, Result};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Fetch, analyze, charge.
    pub pipeline: AnalysisPipeline,
    /// Saved analyses.
    pub records: RecordService,
    /// Profile reads and edits.
    pub profiles: ProfileService,
    /// Per-route request limits.
    pub limiter: RateLimiter,
    /// Access token verification.
    pub tokens: Arc<TokenVerifier>,
    /// Take the caller address from `X-Forwarded-For` instead of the socket peer.
    pub trust_forwarded_for: bool,
}

impl AppState {
    /// Wire every service onto one database and one cache.
    pub fn new(
        db: Database,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        fetcher: Arc<dyn Fetcher>,
        analyst: Arc<dyn Analyst>,
        tokens: TokenVerifier,
    ) -> Self {
        let ledger = CreditLedger::new(db.clone(), cache.clone(), clock.clone());
        Self {
            pipeline: AnalysisPipeline::new(ledger, fetcher, analyst),
            records: RecordService::new(db.clone(), cache.clone()),
            profiles: ProfileService::new(db.clone(), cache),
            limiter: RateLimiter::new(db, clock),
            tokens: Arc::new(tokens),
            trust_forwarded_for: false,
        }
    }

    /// Set when running behind a proxy that overwrites `X-Forwarded-For`.
    pub fn with_trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Count one request from `identity`, failing with 429 when over the limit.
    pub async fn enforce(&self, identity: &str, policy: &Policy) -> Result<()> {
        if self.limiter.allow(identity, policy).await?.is_allowed() {
            Ok(())
        } else {
            Err(ApiError::RateLimited)
        }
    }
}
