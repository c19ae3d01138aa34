use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqirvy_core::{
    Error, ModelProvider, Options, Provider, ProviderSettings, Query, Response, Result,
    TokenUsage, provider_for,
};

use crate::http::{api_key_from_env, build_client, check_key_length, send_json};

/// Env var key for the Gemini API key.
const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// Gemini accepts temperatures up to 2.0.
const TEMPERATURE_SCALE: f32 = 2.0;

/// Provider implementation for Google's Gemini `generateContent` API.
pub struct GeminiProvider {
    /// HTTP client for API requests.
    client: Client,
    /// Gemini API key.
    api_key: String,
    /// Endpoint root, without trailing slash.
    base_url: String,
}

impl GeminiProvider {
    /// Creates a provider with the given API key.
    ///
    /// # Errors
    /// Returns an error if the key is empty or shorter than 20 characters, or
    /// the HTTP client cannot be built.
    pub fn new(api_key: String, settings: &ProviderSettings) -> Result<Self> {
        check_key_length(ENV_GEMINI_API_KEY, &api_key)?;

        Ok(Self {
            client: build_client(settings)?,
            api_key,
            base_url: settings.base_url(Provider::Gemini),
        })
    }

    /// Creates a provider from `GEMINI_API_KEY`.
    ///
    /// # Errors
    /// Returns an error if the env var is missing or invalid.
    pub fn from_env(settings: &ProviderSettings) -> Result<Self> {
        Self::new(api_key_from_env(ENV_GEMINI_API_KEY)?, settings)
    }

    /// Overrides the endpoint root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn build_request<'req>(query: &'req Query, options: &Options) -> GenerateRequest<'req> {
        GenerateRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: &query.system,
                }],
            },
            contents: vec![Content {
                role: "user",
                parts: query
                    .prompts
                    .iter()
                    .map(|prompt| Part { text: prompt })
                    .collect(),
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature * TEMPERATURE_SCALE,
                max_output_tokens: options.effective_max_tokens(&query.model),
            },
        }
    }
}

/// Request payload for `generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'req> {
    /// System prompt, kept apart from the conversation.
    system_instruction: SystemInstruction<'req>,
    /// Conversation turns; a single user turn here.
    contents: Vec<Content<'req>>,
    /// Sampling settings.
    generation_config: GenerationConfig,
}

/// System prompt wrapper.
#[derive(Debug, Serialize)]
struct SystemInstruction<'req> {
    /// Text parts of the system prompt.
    parts: Vec<Part<'req>>,
}

/// One conversation turn.
#[derive(Debug, Serialize)]
struct Content<'req> {
    /// Author of the turn.
    role: &'static str,
    /// One part per prompt.
    parts: Vec<Part<'req>>,
}

/// Text part of a request.
#[derive(Debug, Serialize)]
struct Part<'req> {
    /// Text content.
    text: &'req str,
}

/// Sampling settings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    /// Scaled temperature.
    temperature: f32,
    /// Output token limit.
    max_output_tokens: u32,
}

/// Response payload from `generateContent`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    /// Generated candidates; absent when the prompt was blocked.
    #[serde(default)]
    candidates: Vec<Candidate>,
    /// Token accounting, when reported.
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

/// A single generated candidate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    /// Generated content; missing when the candidate was filtered.
    #[serde(default)]
    content: Option<CandidateContent>,
    /// Why generation stopped.
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Content of a candidate.
#[derive(Debug, Deserialize)]
struct CandidateContent {
    /// Response parts.
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// A response part; only text parts are kept.
#[derive(Debug, Deserialize)]
struct ResponsePart {
    /// Text content, if this is a text part.
    #[serde(default)]
    text: Option<String>,
}

/// Token usage metrics.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    /// Prompt tokens.
    #[serde(default)]
    prompt_token_count: u64,
    /// Generated tokens.
    #[serde(default)]
    candidates_token_count: u64,
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        Provider::Gemini.as_str()
    }

    fn supports_model(&self, model: &str) -> bool {
        matches!(provider_for(model), Ok(Provider::Gemini))
    }

    async fn generate(&self, query: &Query, options: &Options) -> Result<Response> {
        if !self.supports_model(&query.model) {
            return Err(Error::UnsupportedModel(format!(
                "invalid or unsupported Gemini model: {}",
                query.model
            )));
        }
        query.validate()?;

        let start = Instant::now();
        let request_body = Self::build_request(query, options);
        tracing::debug!(model = %query.model, prompts = query.prompts.len(), "sending Gemini request");

        let request = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, query.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body);
        let api_response: GenerateResponse = send_json(request, "Gemini").await?;

        let mut text = String::new();
        for candidate in &api_response.candidates {
            tracing::debug!(finish_reason = ?candidate.finish_reason, "Gemini candidate");
            let parts = candidate.content.iter().flat_map(|content| &content.parts);
            for part in parts {
                if let Some(part_text) = &part.text {
                    text.push_str(part_text);
                }
            }
        }
        if text.is_empty() {
            return Err(Error::InvalidResponse("No response from Gemini".to_owned()));
        }

        let tokens_used = api_response
            .usage_metadata
            .map_or_else(TokenUsage::default, |usage| TokenUsage {
                input: usage.prompt_token_count,
                output: usage.candidates_token_count,
            });

        Ok(Response {
            text,
            tokens_used,
            provider: self.name().to_owned(),
            model: query.model.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
