//! Core trait and types for analyst implementations.
//!
//! An analyst receives one fetched HTTP exchange and returns a plain-text
//! explanation of it. This crate defines:
//!
//! - [`Analyst`] - The trait every analyst backend implements
//! - [`AnalysisSubject`] - What gets analyzed (URL, status, headers, body)
//! - [`AnalystError`] - Error types for analyst calls
//! - [`prompt`] - The shared prompt text
//!
//! # Example
//!
//! ```rust
//! use analyst_core::{AnalysisSubject, Analyst, AnalystError};
//! use async_trait::async_trait;
//!
//! struct StatusAnalyst;
//!
//! #[async_trait]
//! impl Analyst for StatusAnalyst {
//!     async fn analyze(&self, subject: &AnalysisSubject) -> Result<String, AnalystError> {
//!         Ok(format!("{} answered {}", subject.url, subject.status))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "StatusAnalyst"
//!     }
//! }
//! ```

mod error;
pub mod prompt;
mod subject;
mod trait_def;

pub use error::AnalystError;
pub use subject::AnalysisSubject;
pub use trait_def::Analyst;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
