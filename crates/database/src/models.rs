//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Avatar assigned to accounts that never set one.
pub const DEFAULT_AVATAR: &str = "https://img.freepik.com/premium-vector/default-avatar-profile-icon-social-media-user-image-gray-avatar-icon-blank-profile-silhouette-vector-illustration_561158-3407.jpg";

/// Credits granted at account creation and on every refill.
pub const DEFAULT_CREDITS: i64 = 50;

/// An account with its credit balance and analysis settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Opaque unique id (UUID text).
    pub id: String,
    /// Display name ("Firstname Lastname").
    pub fullname: String,
    /// Login email, unique.
    pub email: String,
    /// Avatar URL.
    pub avatar: String,
    /// Subscription plan: "starter", "pro" or "enterprise".
    pub plan: String,
    /// Role: "admin", "user" or "creator".
    pub role: String,
    /// Consumable balance. May go negative under the documented charge race.
    pub credits: i64,
    /// Epoch milliseconds after which the balance is refilled.
    pub credit_refill_date: i64,
    /// User-controlled switch for paid AI analysis.
    pub enable_ai_analysis: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Fields needed to create an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub avatar: String,
    pub plan: String,
    pub role: String,
}

impl NewAccount {
    /// A starter-plan user with the default avatar.
    pub fn new(id: impl Into<String>, fullname: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fullname: fullname.into(),
            email: email.into().trim().to_lowercase(),
            avatar: DEFAULT_AVATAR.to_string(),
            plan: "starter".to_string(),
            role: "user".to_string(),
        }
    }
}

/// Which counter space a rate-limit record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitScope {
    /// Keyed by normalized client IP.
    Ip,
    /// Keyed by authenticated account id.
    User,
}

impl RateLimitScope {
    /// Column value for this scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Ip => "ip",
            RateLimitScope::User => "user",
        }
    }
}

impl std::fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed-window counter for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RateLimitRecord {
    /// "ip" or "user".
    pub scope: String,
    /// Normalized IP or account id.
    pub identity: String,
    /// Epoch milliseconds at which the current window began.
    pub window_start: i64,
    /// Requests observed since `window_start`.
    pub count: i64,
}

/// A header or query parameter pair. Values keep their JSON type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: serde_json::Value,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A saved analysis as submitted by the owner.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysis {
    pub id: String,
    pub account_id: String,
    pub endpoint: String,
    pub method: String,
    pub request_headers: Vec<KeyValue>,
    pub request_query_params: Vec<KeyValue>,
    pub request_body: Option<String>,
    pub response_status: i64,
    pub response_headers: Vec<KeyValue>,
    pub response_body: Option<String>,
    pub ai_analysis: Option<String>,
    pub cost: i64,
}

/// A stored analysis with every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: String,
    pub account_id: String,
    pub endpoint: String,
    pub method: String,
    pub request_headers: Vec<KeyValue>,
    pub request_query_params: Vec<KeyValue>,
    pub request_body: Option<String>,
    pub response_status: i64,
    pub response_headers: Vec<KeyValue>,
    pub response_body: Option<String>,
    pub ai_analysis: Option<String>,
    pub cost: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// The listing projection of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub id: String,
    pub endpoint: String,
    pub method: String,
    pub response_status: i64,
    pub ai_analysis: Option<String>,
    pub cost: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Optional listing filters. All set filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisFilter {
    /// Case-insensitive substring of the endpoint or the AI text.
    pub search_query: Option<String>,
    /// Exact HTTP method.
    pub method: Option<String>,
    /// Exact upstream status code.
    pub status: Option<i64>,
}
