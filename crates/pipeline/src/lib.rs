//! Credit ledger, rate limiter and analysis pipeline for Probe.
//!
//! This crate holds the behavior behind every Probe route:
//!
//! - [`CreditLedger`]: monthly refill and post-success charging
//! - [`RateLimiter`]: fixed-window counters per IP or per user
//! - [`AnalysisPipeline`]: fetch a user's request, optionally analyze it, charge
//! - [`RecordService`] and [`ProfileService`]: saved analyses and profiles,
//!   read through the cache
//!
//! The HTTP layer only maps inputs to these calls and [`PipelineError`]s to
//! responses.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use cache_store::InMemoryCacheStore;
//! use database::Database;
//! use mock_analyst::CannedAnalyst;
//! use pipeline::{AnalysisPipeline, CreditLedger, HttpFetcher, OutboundRequest, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:probe.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let ledger = CreditLedger::new(db, Arc::new(InMemoryCacheStore::new()), Arc::new(SystemClock));
//!     let pipeline = AnalysisPipeline::new(
//!         ledger,
//!         Arc::new(HttpFetcher::new(Duration::from_secs(30))?),
//!         Arc::new(CannedAnalyst::default()),
//!     );
//!
//!     let outcome = pipeline
//!         .run("account-id", &OutboundRequest::new("GET", "https://example.com/api"))
//!         .await?;
//!     println!("{} -> {:?}", outcome.response.status, outcome.ai_analysis);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod error;
pub mod fetch;
pub mod ledger;
pub mod pipeline;
pub mod profile;
pub mod rate_limit;
pub mod records;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorCode, PipelineError, Result};
pub use fetch::{FetchError, FetchedResponse, Fetcher, HttpFetcher, OutboundRequest};
pub use ledger::{CreditLedger, REFILL_AMOUNT, REFILL_PERIOD_MS};
pub use pipeline::{AnalysisOutcome, AnalysisPipeline, OutcomeInfo, RequestEcho};
pub use profile::{AuthState, ProfileEdit, ProfileService, ProfileSnapshot};
pub use rate_limit::{normalize_ip, Decision, Policy, RateLimiter};
pub use records::{AnalysisPage, ListQuery, RecordService, SaveAnalysis, MAX_PAGE, PAGE_SIZE};
