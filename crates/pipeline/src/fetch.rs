//! Outbound HTTP calls on behalf of a user.
//!
//! Any response that arrives is a result, whatever its status. Only a
//! request that never got a response, or could not be built, is an error.

use std::time::Duration;

use async_trait::async_trait;
use database::KeyValue;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the outbound call.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request was sent but nothing came back.
    #[error("no response received from the server: {0}")]
    NoResponse(String),

    /// The request could not be constructed.
    #[error("error setting up the request: {0}")]
    Setup(String),
}

/// The request a user asked us to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundRequest {
    pub endpoint: String,
    pub method: String,
    #[serde(default)]
    pub headers: Vec<KeyValue>,
    #[serde(default)]
    pub query_params: Vec<KeyValue>,
    #[serde(default)]
    pub body: Option<String>,
}

impl OutboundRequest {
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: method.into(),
            headers: Vec::new(),
            query_params: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.push(KeyValue::new(key, value));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.push(KeyValue::new(key, value));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// What came back from the target endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedResponse {
    pub status: u16,
    pub headers: Vec<KeyValue>,
    /// Parsed JSON when the body parsed, else the raw text as a JSON string.
    pub body: Value,
}

impl FetchedResponse {
    /// Headers as a JSON object; later duplicates win.
    pub fn headers_object(&self) -> Value {
        let map = self
            .headers
            .iter()
            .map(|kv| (kv.key.clone(), kv.value.clone()))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }

    /// Body as stored text: JSON bodies re-serialized, text bodies verbatim.
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Performs the outbound call.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &OutboundRequest) -> Result<FetchedResponse, FetchError>;
}

/// Header/query value as text; `None` for empty values, which are skipped.
fn pair_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Non-empty `(key, value)` pairs.
pub fn usable_pairs(pairs: &[KeyValue]) -> Vec<(String, String)> {
    pairs
        .iter()
        .filter(|kv| !kv.key.is_empty())
        .filter_map(|kv| pair_value(&kv.value).map(|value| (kv.key.clone(), value)))
        .collect()
}

/// [`Fetcher`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Setup(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Use an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &OutboundRequest) -> Result<FetchedResponse, FetchError> {
        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|e| FetchError::Setup(format!("invalid method {:?}: {}", request.method, e)))?;

        let mut builder = self
            .client
            .request(method, &request.endpoint)
            .query(&usable_pairs(&request.query_params));

        for (key, value) in usable_pairs(&request.headers) {
            builder = builder.header(key, value);
        }

        if let Some(body) = request.body.as_deref().filter(|b| !b.is_empty()) {
            builder = match serde_json::from_str::<Value>(body) {
                Ok(json) => builder.json(&json),
                Err(_) => builder.body(body.to_string()),
            };
        }

        debug!(method = %request.method, endpoint = %request.endpoint, "Sending outbound request");

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                FetchError::Setup(e.to_string())
            } else {
                warn!(endpoint = %request.endpoint, error = %e, "Outbound request got no response");
                FetchError::NoResponse(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                KeyValue::new(name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned())
            })
            .collect();

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::NoResponse(format!("failed to read body: {}", e)))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        debug!(status, "Outbound request completed");

        Ok(FetchedResponse {
            status,
            headers,
            body,
        })
    }
}
