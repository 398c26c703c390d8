//! Mock analyst implementations.
//!
//! This crate provides implementations of the `Analyst` trait for tests:
//! - `CannedAnalyst` - Returns fixed text
//! - `FailingAnalyst` - Always fails
//! - `CountingAnalyst` - Wraps another analyst and counts calls
//! - `DelayedAnalyst` - Wraps another analyst with artificial delay
//!
//! For production analysis, use the `openrouter-analyst` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_analyst::{AnalysisSubject, Analyst, CannedAnalyst, CountingAnalyst};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_analyst::AnalystError> {
//!     let analyst = CountingAnalyst::new(CannedAnalyst::new("Looks fine"));
//!     let subject = AnalysisSubject::new("https://x.io", 200, Default::default(), Default::default());
//!
//!     assert_eq!(analyst.analyze(&subject).await?, "Looks fine");
//!     assert_eq!(analyst.calls(), 1);
//!     Ok(())
//! }
//! ```

mod canned;
mod counting;
mod delayed;
mod failing;

// Re-export analyst-core types for convenience
pub use analyst_core::{async_trait, AnalysisSubject, Analyst, AnalystError};

pub use canned::CannedAnalyst;
pub use counting::CountingAnalyst;
pub use delayed::DelayedAnalyst;
pub use failing::FailingAnalyst;
