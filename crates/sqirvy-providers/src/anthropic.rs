use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqirvy_core::{
    Error, ModelProvider, Options, Provider, ProviderSettings, Query, Response, Result,
    TokenUsage, provider_for,
};

use crate::http::{MIN_API_KEY_LEN, api_key_from_env, build_client, send_json};

/// Env var key for the Anthropic API key.
const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
/// Messages API version header value.
const API_VERSION: &str = "2023-06-01";
/// Anthropic already takes temperature on a 0.0 to 1.0 scale.
const TEMPERATURE_SCALE: f32 = 1.0;

/// Provider implementation for the Anthropic Messages API.
pub struct AnthropicProvider {
    /// HTTP client for API requests.
    client: Client,
    /// Anthropic API key.
    api_key: String,
    /// Endpoint root, without trailing slash.
    base_url: String,
}

impl AnthropicProvider {
    /// Creates a provider with the given API key.
    ///
    /// # Errors
    /// Returns an error if the key is empty, shorter than 20 characters or
    /// lacks the `sk-` prefix, or the HTTP client cannot be built.
    pub fn new(api_key: String, settings: &ProviderSettings) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingApiKey(ENV_ANTHROPIC_API_KEY.to_owned()));
        }
        if api_key.len() < MIN_API_KEY_LEN || !api_key.starts_with("sk-") {
            return Err(Error::InvalidApiKey(format!(
                "{ENV_ANTHROPIC_API_KEY} must start with sk- and be at least {MIN_API_KEY_LEN} characters"
            )));
        }

        Ok(Self {
            client: build_client(settings)?,
            api_key,
            base_url: settings.base_url(Provider::Anthropic),
        })
    }

    /// Creates a provider from `ANTHROPIC_API_KEY`.
    ///
    /// # Errors
    /// Returns an error if the env var is missing or invalid.
    pub fn from_env(settings: &ProviderSettings) -> Result<Self> {
        Self::new(api_key_from_env(ENV_ANTHROPIC_API_KEY)?, settings)
    }

    /// Overrides the endpoint root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Builds the request body: top-level system prompt, one user turn holding
    /// one text block per prompt.
    fn build_request<'req>(query: &'req Query, options: &Options) -> MessagesRequest<'req> {
        MessagesRequest {
            model: &query.model,
            max_tokens: options.effective_max_tokens(&query.model),
            temperature: options.temperature * TEMPERATURE_SCALE,
            system: &query.system,
            messages: vec![RequestMessage {
                role: "user",
                content: query
                    .prompts
                    .iter()
                    .map(|prompt| TextBlock {
                        kind: "text",
                        text: prompt,
                    })
                    .collect(),
            }],
        }
    }
}

/// Request payload for `POST /v1/messages`.
#[derive(Debug, Serialize)]
struct MessagesRequest<'req> {
    /// Model identifier.
    model: &'req str,
    /// Completion token limit.
    max_tokens: u32,
    /// Sampling temperature.
    temperature: f32,
    /// System prompt.
    system: &'req str,
    /// Conversation turns.
    messages: Vec<RequestMessage<'req>>,
}

/// A single conversation turn.
#[derive(Debug, Serialize)]
struct RequestMessage<'req> {
    /// Author role.
    role: &'static str,
    /// Content blocks.
    content: Vec<TextBlock<'req>>,
}

/// Text content block.
#[derive(Debug, Serialize)]
struct TextBlock<'req> {
    /// Always `text`.
    #[serde(rename = "type")]
    kind: &'static str,
    /// Block text.
    text: &'req str,
}

/// Response payload from the Messages API.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    /// Generated content blocks.
    content: Vec<ContentBlock>,
    /// Stop reason reported by the API.
    #[serde(default)]
    stop_reason: Option<String>,
    /// Token accounting.
    usage: Usage,
}

/// Content block in a response; only text blocks carry output.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    /// Generated text.
    Text {
        /// Text content.
        text: String,
    },
    /// Any other block kind.
    #[serde(other)]
    Other,
}

/// Token counts reported by Anthropic.
#[derive(Debug, Deserialize)]
struct Usage {
    /// Prompt tokens.
    input_tokens: u64,
    /// Completion tokens.
    output_tokens: u64,
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        Provider::Anthropic.as_str()
    }

    fn supports_model(&self, model: &str) -> bool {
        matches!(provider_for(model), Ok(Provider::Anthropic))
    }

    async fn generate(&self, query: &Query, options: &Options) -> Result<Response> {
        if !self.supports_model(&query.model) {
            return Err(Error::UnsupportedModel(format!(
                "invalid or unsupported Anthropic model: {}",
                query.model
            )));
        }
        query.validate()?;

        let start = Instant::now();
        let request_body = Self::build_request(query, options);
        tracing::debug!(
            model = %query.model,
            prompts = query.prompts.len(),
            max_tokens = request_body.max_tokens,
            "sending Anthropic request"
        );

        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request_body);
        let api_response: MessagesResponse = send_json(request, "Anthropic").await?;

        tracing::debug!(stop_reason = ?api_response.stop_reason, "Anthropic response received");

        let text: String = api_response
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect();
        if text.is_empty() {
            return Err(Error::InvalidResponse(
                "No text content in response".to_owned(),
            ));
        }

        Ok(Response {
            text,
            tokens_used: TokenUsage {
                input: api_response.usage.input_tokens,
                output: api_response.usage.output_tokens,
            },
            provider: self.name().to_owned(),
            model: query.model.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
