//! OpenRouter-backed analyst.
//!
//! Sends each fetched response to an OpenAI-compatible chat completion
//! endpoint (OpenRouter by default) and returns the model's explanation.
//!
//! # Usage
//!
//! ```rust,no_run
//! use openrouter_analyst::OpenRouterAnalyst;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyst = OpenRouterAnalyst::from_env()?;
//!     // Hand it to the pipeline as Arc<dyn Analyst>...
//!     Ok(())
//! }
//! ```

mod analyst;
mod api_types;
mod config;

pub use analyst::OpenRouterAnalyst;
pub use config::{OpenRouterConfig, OpenRouterConfigBuilder};

// Re-export analyst-core types for convenience
pub use analyst_core::{async_trait, AnalysisSubject, Analyst, AnalystError};
