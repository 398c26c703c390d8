//! Configuration for OpenRouterAnalyst.

use analyst_core::AnalystError;
use std::env;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Configuration for OpenRouterAnalyst.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// Base URL; `/chat/completions` is appended.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Sent as `HTTP-Referer` for OpenRouter app attribution.
    pub referer: Option<String>,

    /// Sent as `X-Title` for OpenRouter app attribution.
    pub title: Option<String>,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            referer: Some("https://localhost:3000".to_string()),
            title: Some("Probe".to_string()),
            max_tokens: None,
            temperature: None,
            timeout_secs: 60,
        }
    }
}

impl OpenRouterConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENROUTER_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `OPENROUTER_API_URL` - Base URL (default: https://openrouter.ai/api/v1)
    /// - `OPENROUTER_MODEL` - Model name (default: openai/gpt-4o-mini)
    /// - `OPENROUTER_REFERER` - `HTTP-Referer` header (default: https://localhost:3000)
    /// - `OPENROUTER_TITLE` - `X-Title` header (default: Probe)
    /// - `OPENROUTER_MAX_TOKENS` - Max tokens (default: provider default)
    /// - `OPENROUTER_TEMPERATURE` - Temperature (default: provider default)
    /// - `OPENROUTER_TIMEOUT_SECS` - Request timeout (default: 60)
    pub fn from_env() -> Result<Self, AnalystError> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .map_err(|_| AnalystError::Configuration("OPENROUTER_API_KEY not set".to_string()))?;

        let defaults = Self::default();

        let api_url = env::var("OPENROUTER_API_URL").unwrap_or(defaults.api_url);
        let model = env::var("OPENROUTER_MODEL").unwrap_or(defaults.model);
        let referer = env::var("OPENROUTER_REFERER").ok().or(defaults.referer);
        let title = env::var("OPENROUTER_TITLE").ok().or(defaults.title);

        let max_tokens = env::var("OPENROUTER_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok());

        let temperature = env::var("OPENROUTER_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok());

        let timeout_secs = env::var("OPENROUTER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Ok(Self {
            api_url,
            api_key,
            model,
            referer,
            title,
            max_tokens,
            temperature,
            timeout_secs,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> OpenRouterConfigBuilder {
        OpenRouterConfigBuilder::default()
    }

    /// Full chat completions URL.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

/// Builder for OpenRouterConfig.
#[derive(Debug, Default)]
pub struct OpenRouterConfigBuilder {
    config: OpenRouterConfig,
}

impl OpenRouterConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.config.referer = Some(referer.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenRouterConfig {
        self.config
    }
}
