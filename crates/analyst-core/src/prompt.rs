//! Prompt text shared by chat-based analysts.

use crate::subject::AnalysisSubject;

/// Returned when the backend produced no text.
pub const EMPTY_ANALYSIS: &str = "No analysis available";

/// System prompt for response analysis.
pub const SYSTEM_PROMPT: &str = "You are a technical API Response Analyst. Your job is to examine HTTP responses and provide clear, accurate, and actionable explanations with no filler.

Analyze:
- URL
- Status
- Headers
- Body

Deliver:
- What the endpoint is doing
- Status code meaning
- Body explanation
- Issues or inconsistencies
- Fix suggestions
- Any security/performance red flags";

/// Build the user prompt for one response.
pub fn user_prompt(subject: &AnalysisSubject) -> String {
    let headers = serde_json::to_string_pretty(&subject.headers).unwrap_or_else(|_| "{}".to_string());
    let body = serde_json::to_string_pretty(&subject.body).unwrap_or_else(|_| "null".to_string());

    format!(
        "Analyze the following API response.\n\nURL: {}\n\nStatus: {}\n\nHeaders:\n{}\n\nBody:\n{}\n",
        subject.url, subject.status, headers, body
    )
}
