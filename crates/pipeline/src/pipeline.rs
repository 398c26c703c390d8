//! The analysis pipeline.
//!
//! ```text
//! RefillCheck -> Fetch -> AiGate -> CreditGate -> Analyze -> Charge
//!                  |        |           |            |
//!               failure  ai_disabled  insufficient  analysis_error
//!                        (cost 0)     (cost 1,      (failure,
//!                                      no charge)    no charge)
//! ```
//!
//! The charge is the last step. Between the credit gate and the charge the
//! balance is not locked, so two concurrent requests that both see one
//! credit can both be charged and leave the balance at -1. Nothing is ever
//! charged for a failed analysis.

use std::sync::Arc;

use analyst_core::{AnalysisSubject, Analyst};
use database::KeyValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{PipelineError, Result};
use crate::fetch::{FetchedResponse, Fetcher, OutboundRequest};
use crate::ledger::CreditLedger;

/// Why a run did not produce a paid analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeInfo {
    AiDisabled,
    InsufficientCredits,
    AnalysisError,
}

impl OutcomeInfo {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeInfo::AiDisabled => "ai_disabled",
            OutcomeInfo::InsufficientCredits => "insufficient_credits",
            OutcomeInfo::AnalysisError => "analysis_error",
        }
    }
}

/// The request half of an outcome, as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEcho {
    pub endpoint: String,
    pub method: String,
    pub headers: Vec<KeyValue>,
    pub query_params: Vec<KeyValue>,
    pub body: Option<String>,
}

impl From<&OutboundRequest> for RequestEcho {
    fn from(request: &OutboundRequest) -> Self {
        Self {
            endpoint: request.endpoint.clone(),
            method: request.method.to_uppercase(),
            headers: request.headers.clone(),
            query_params: request.query_params.clone(),
            body: request.body.clone(),
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub request: RequestEcho,
    pub response: FetchedResponse,
    pub ai_analysis: Option<String>,
    /// Credits this outcome costs: 0 or 1.
    pub cost: i64,
    /// Absent on a full, charged success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<OutcomeInfo>,
    /// Balance after the run.
    pub credits: i64,
}

/// Runs fetch, optional analysis and charge for one request.
#[derive(Clone)]
pub struct AnalysisPipeline {
    ledger: CreditLedger,
    fetcher: Arc<dyn Fetcher>,
    analyst: Arc<dyn Analyst>,
}

impl AnalysisPipeline {
    pub fn new(ledger: CreditLedger, fetcher: Arc<dyn Fetcher>, analyst: Arc<dyn Analyst>) -> Self {
        Self {
            ledger,
            fetcher,
            analyst,
        }
    }

    /// Get the ledger this pipeline charges.
    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    /// Run the pipeline for `account_id`.
    pub async fn run(&self, account_id: &str, request: &OutboundRequest) -> Result<AnalysisOutcome> {
        // RefillCheck
        let account = self.ledger.load(account_id).await?;
        let account = self.ledger.refill_if_due(account).await?;

        // Fetch
        let response = self.fetcher.fetch(request).await?;
        debug!(account_id, status = response.status, "Fetched endpoint");

        let outcome = |ai_analysis: Option<String>, cost: i64, info: Option<OutcomeInfo>, credits: i64| {
            AnalysisOutcome {
                request: RequestEcho::from(request),
                response: response.clone(),
                ai_analysis,
                cost,
                info,
                credits,
            }
        };

        // AiGate
        if !account.enable_ai_analysis {
            info!(account_id, "AI analysis disabled, skipping");
            return Ok(outcome(None, 0, Some(OutcomeInfo::AiDisabled), account.credits));
        }

        // CreditGate
        if account.credits < 1 {
            info!(account_id, credits = account.credits, "Insufficient credits, skipping analysis");
            return Ok(outcome(
                None,
                1,
                Some(OutcomeInfo::InsufficientCredits),
                account.credits,
            ));
        }

        // Analyze
        let subject = AnalysisSubject::new(
            request.endpoint.clone(),
            response.status,
            response.headers_object(),
            response.body.clone(),
        );
        let text = match self.analyst.analyze(&subject).await {
            Ok(text) => text,
            Err(source) => {
                error!(
                    account_id,
                    analyst = self.analyst.name(),
                    error = %source,
                    "Analysis failed, not charging"
                );
                return Err(PipelineError::Analysis {
                    source,
                    outcome: Box::new(outcome(
                        None,
                        0,
                        Some(OutcomeInfo::AnalysisError),
                        account.credits,
                    )),
                });
            }
        };

        // Charge
        let charged = self.ledger.charge_one(account_id).await?;
        Ok(outcome(Some(text), 1, None, charged.credits))
    }
}
