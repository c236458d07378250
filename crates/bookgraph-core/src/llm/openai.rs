//! OpenAI-compatible chat-completions gateway.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use super::{CompletionGateway, CompletionRequest};
use crate::error::{CompletionError, Error, Result};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for [`OpenAiGateway`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API root, without the trailing `/chat/completions`
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Per-call deadline; exceeding it yields a timeout error
    pub timeout: Duration,
    /// Models the gateway may call; empty allows any
    pub allowed_models: Vec<String>,
}

impl OpenAiConfig {
    /// Creates a config with default endpoint and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            allowed_models: Vec::new(),
        }
    }

    /// Overrides the API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restricts the models the gateway may call.
    pub fn with_allowed_models(mut self, models: Vec<String>) -> Self {
        self.allowed_models = models;
        self
    }
}

/// Gateway speaking the OpenAI chat-completions protocol with JSON-schema
/// structured output.
pub struct OpenAiGateway {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiGateway {
    /// Builds the HTTP client and gateway.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::config("an API key is required for the OpenAI gateway"));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn check_model(&self, model: &str) -> std::result::Result<(), CompletionError> {
        if self.config.allowed_models.is_empty()
            || self.config.allowed_models.iter().any(|m| m == model)
        {
            Ok(())
        } else {
            Err(CompletionError::unsupported_model(model))
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

/// Builds the chat-completions request body.
pub(crate) fn request_body(request: &CompletionRequest) -> serde_json::Value {
    json!({
        "model": request.model,
        "messages": request.messages,
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": request.shape.name,
                "schema": request.shape.schema,
                "strict": false,
            }
        }
    })
}

/// Extracts the structured value from a chat-completions response body.
pub(crate) fn parse_response(
    body: &serde_json::Value,
) -> std::result::Result<serde_json::Value, CompletionError> {
    let message = &body["choices"][0]["message"];
    if let Some(refusal) = message["refusal"].as_str() {
        return Err(CompletionError::schema(format!("model refused: {refusal}")));
    }
    let content = message["content"]
        .as_str()
        .ok_or_else(|| CompletionError::schema("response has no message content"))?;
    serde_json::from_str(content).map_err(|e| {
        CompletionError::schema(format!("message content is not JSON: {e}")).with_source(e)
    })
}

fn map_transport(error: reqwest::Error) -> CompletionError {
    if error.is_timeout() {
        CompletionError::timeout("completion request timed out").with_source(error)
    } else {
        CompletionError::transport(format!("completion request failed: {error}"))
            .with_source(error)
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete_value(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<serde_json::Value, CompletionError> {
        self.check_model(&request.model)?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request_body(&request))
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                model = %request.model,
                "Completion request rejected"
            );
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(CompletionError::rate_limited(error_text));
            }
            return Err(CompletionError::provider(status.as_u16(), error_text));
        }

        let body: serde_json::Value = response.json().await.map_err(map_transport)?;

        tracing::debug!(
            model = %request.model,
            total_tokens = body["usage"]["total_tokens"].as_u64().unwrap_or(0),
            "Completion received"
        );

        parse_response(&body)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
