//! OpenRouterAnalyst implementation.

use std::time::Duration;

use analyst_core::prompt::{self, EMPTY_ANALYSIS, SYSTEM_PROMPT};
use analyst_core::{async_trait, AnalysisSubject, Analyst, AnalystError};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::OpenRouterConfig;

/// An analyst that asks a chat completion model to explain a response.
pub struct OpenRouterAnalyst {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterAnalyst {
    /// Create a new analyst with the given configuration.
    pub fn new(config: OpenRouterConfig) -> Result<Self, AnalystError> {
        if config.api_key.trim().is_empty() {
            return Err(AnalystError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalystError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "OpenRouterAnalyst initialized with model: {}, url: {}",
            config.model, config.api_url
        );

        Ok(Self { client, config })
    }

    /// Create an analyst from environment variables.
    ///
    /// See [`OpenRouterConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, AnalystError> {
        Self::new(OpenRouterConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    fn build_request(&self, subject: &AnalysisSubject) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(prompt::user_prompt(subject)),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AnalystError> {
        let mut builder = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(request);

        if let Some(ref referer) = self.config.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(ref title) = self.config.title {
            builder = builder.header("X-Title", title);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AnalystError::Timeout
            } else {
                AnalystError::Network(format!("Failed to send request: {}", e))
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);

            return Err(AnalystError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AnalystError::Timeout
            } else {
                AnalystError::InvalidResponse(format!("Failed to parse response: {}", e))
            }
        })?;

        Ok(completion)
    }
}

#[async_trait]
impl Analyst for OpenRouterAnalyst {
    async fn analyze(&self, subject: &AnalysisSubject) -> Result<String, AnalystError> {
        debug!(url = %subject.url, status = subject.status, "Analyzing response");

        let request = self.build_request(subject);
        let completion = self.chat_completion(&request).await?;

        if let Some(ref usage) = completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let text = match completion.first_text() {
            Some(text) => text.to_string(),
            None => {
                warn!(
                    id = completion.id.as_deref().unwrap_or("-"),
                    model = completion.model.as_deref().unwrap_or("-"),
                    finish_reason = completion
                        .choices
                        .first()
                        .and_then(|c| c.finish_reason.as_deref())
                        .unwrap_or("-"),
                    "No content in completion, using default"
                );
                EMPTY_ANALYSIS.to_string()
            }
        };

        Ok(text)
    }

    fn name(&self) -> &str {
        "OpenRouterAnalyst"
    }
}
