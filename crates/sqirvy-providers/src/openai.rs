use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqirvy_core::{
    Error, ModelProvider, Options, Provider, ProviderSettings, Query, Response, Result,
    TokenUsage,
};

use crate::http::{api_key_from_env, build_client, check_key_length, send_json};

/// Env var key for the `OpenAI` API key.
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// `OpenAI` accepts temperatures up to 2.0.
const TEMPERATURE_SCALE: f32 = 2.0;

/// Provider implementation for the `OpenAI` chat completions API.
///
/// Any model name is accepted, so this adapter also serves unregistered
/// models behind compatible endpoints (set `OPENAI_BASE_URL`).
pub struct OpenAiProvider {
    /// HTTP client for API requests.
    client: Client,
    /// `OpenAI` API key.
    api_key: String,
    /// Endpoint root, without trailing slash.
    base_url: String,
}

impl OpenAiProvider {
    /// Creates a provider with the given API key.
    ///
    /// # Errors
    /// Returns an error if the key is empty or shorter than 20 characters, or
    /// the HTTP client cannot be built.
    pub fn new(api_key: String, settings: &ProviderSettings) -> Result<Self> {
        check_key_length(ENV_OPENAI_API_KEY, &api_key)?;

        Ok(Self {
            client: build_client(settings)?,
            api_key,
            base_url: settings.base_url(Provider::OpenAi),
        })
    }

    /// Creates a provider from `OPENAI_API_KEY`.
    ///
    /// # Errors
    /// Returns an error if the env var is missing or invalid.
    pub fn from_env(settings: &ProviderSettings) -> Result<Self> {
        Self::new(api_key_from_env(ENV_OPENAI_API_KEY)?, settings)
    }

    /// Overrides the endpoint root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// System message first, then one user message per prompt.
    fn build_messages(query: &Query) -> Vec<ChatMessage<'_>> {
        let mut messages = Vec::with_capacity(query.prompts.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: &query.system,
        });
        messages.extend(query.prompts.iter().map(|prompt| ChatMessage {
            role: "user",
            content: prompt,
        }));
        messages
    }
}

/// Request payload for `POST /chat/completions`.
#[derive(Debug, Serialize)]
struct ChatRequest<'req> {
    /// Model identifier.
    model: &'req str,
    /// Conversation messages.
    messages: Vec<ChatMessage<'req>>,
    /// Sampling temperature.
    temperature: f32,
    /// Completion token limit.
    max_completion_tokens: u32,
}

/// Message delivered to the API.
#[derive(Debug, Serialize)]
struct ChatMessage<'req> {
    /// Role of the message author.
    role: &'static str,
    /// Textual content.
    content: &'req str,
}

/// Response payload from the chat completions API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// Candidate completions.
    choices: Vec<Choice>,
    /// Token accounting, when reported.
    #[serde(default)]
    usage: Option<Usage>,
}

/// A single completion choice.
#[derive(Debug, Deserialize)]
struct Choice {
    /// Generated message.
    message: ResponseMessage,
    /// Why generation stopped.
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Generated message; content may be null for refusals or tool calls.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    /// Generated text.
    #[serde(default)]
    content: Option<String>,
}

/// Token usage metrics.
#[derive(Debug, Deserialize)]
struct Usage {
    /// Prompt tokens.
    prompt_tokens: u64,
    /// Completion tokens.
    completion_tokens: u64,
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        Provider::OpenAi.as_str()
    }

    fn supports_model(&self, model: &str) -> bool {
        !model.trim().is_empty()
    }

    async fn generate(&self, query: &Query, options: &Options) -> Result<Response> {
        if !self.supports_model(&query.model) {
            return Err(Error::UnsupportedModel(
                "model name cannot be empty".to_owned(),
            ));
        }
        query.validate()?;

        let start = Instant::now();
        let request_body = ChatRequest {
            model: &query.model,
            messages: Self::build_messages(query),
            temperature: options.temperature * TEMPERATURE_SCALE,
            max_completion_tokens: options.effective_max_tokens(&query.model),
        };
        tracing::debug!(
            model = %query.model,
            base_url = %self.base_url,
            prompts = query.prompts.len(),
            "sending OpenAI request"
        );

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body);
        let api_response: ChatResponse = send_json(request, "OpenAI").await?;

        let mut text = String::new();
        for choice in &api_response.choices {
            tracing::debug!(finish_reason = ?choice.finish_reason, "OpenAI choice");
            if let Some(content) = &choice.message.content {
                text.push_str(content);
            }
        }
        if api_response.choices.is_empty() {
            return Err(Error::InvalidResponse("No response from OpenAI".to_owned()));
        }
        if text.is_empty() {
            return Err(Error::InvalidResponse(
                "No text content in response".to_owned(),
            ));
        }

        let tokens_used = api_response
            .usage
            .map_or_else(TokenUsage::default, |usage| TokenUsage {
                input: usage.prompt_tokens,
                output: usage.completion_tokens,
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_KEY: &str = "sk-proj-test-0123456789abcdef";

    fn provider(base_url: &str) -> OpenAiProvider {
        OpenAiProvider::new(TEST_KEY.to_owned(), &ProviderSettings::default())
            .unwrap()
            .with_base_url(base_url)
    }

    fn chat_reply(content: &str) -> Value {
        json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 9, "completion_tokens": 4, "total_tokens": 13}
        })
    }

    #[test]
    fn test_build_messages_order() {
        let query = Query::new("system text", "gpt-5")
            .with_prompts(vec!["first".to_owned(), "second".to_owned()]);
        let messages = OpenAiProvider::build_messages(&query);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "system text");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].content, "second");
    }

    #[test]
    fn test_accepts_unregistered_models() {
        let provider = provider("http://localhost");
        assert!(provider.supports_model("gpt-5-mini"));
        assert!(provider.supports_model("llama3.3:70b"));
        assert!(!provider.supports_model(""));
    }

    #[tokio::test]
    async fn test_generate_sends_scaled_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token(TEST_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("fn main() {}")))
            .expect(1)
            .mount(&server)
            .await;

        let query = Query::new("write code", "gpt-5-mini").with_prompts(vec!["hello".to_owned()]);
        let options = Options {
            temperature: 0.5,
            max_tokens: 1_000,
        };
        let response = provider(&format!("{}/v1", server.uri()))
            .generate(&query, &options)
            .await
            .unwrap();

        assert_eq!(response.text, "fn main() {}");
        assert_eq!(response.tokens_used.total(), 13);
        assert_eq!(response.provider, "openai");

        let requests = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["model"], "gpt-5-mini");
        assert_eq!(sent["temperature"], 1.0);
        assert_eq!(sent["max_completion_tokens"], 1_000);
        assert_eq!(sent["messages"][0]["role"], "system");
        assert_eq!(sent["messages"][1]["content"], "hello");
    }

    #[tokio::test]
    async fn test_generate_unregistered_model_on_compatible_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("ok")))
            .mount(&server)
            .await;

        let query = Query::new("", "qwen2.5-coder:7b").with_prompts(vec!["ping".to_owned()]);
        let options = Options {
            temperature: 0.1,
            max_tokens: 0,
        };
        let response = provider(&server.uri()).generate(&query, &options).await.unwrap();
        assert_eq!(response.text, "ok");

        let requests = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["max_completion_tokens"], 4_096);
    }

    #[tokio::test]
    async fn test_generate_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let query = Query::new("", "gpt-5").with_prompts(vec!["hi".to_owned()]);
        let error = provider(&server.uri())
            .generate(&query, &Options::default())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Provider(_)));
        assert!(error.to_string().contains("OpenAI API request failed with status 500"));
    }

    #[tokio::test]
    async fn test_generate_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let query = Query::new("", "gpt-5").with_prompts(vec!["hi".to_owned()]);
        let error = provider(&server.uri())
            .generate(&query, &Options::default())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_rejects_replies_without_text() {
        let replies = [
            json!({"choices": [{"message": {"content": null}, "finish_reason": "length"}]}),
            json!({"choices": [{"message": {"role": "assistant", "content": ""}, "finish_reason": "stop"}]}),
            json!({"choices": []}),
        ];
        for reply in replies {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
                .mount(&server)
                .await;

            let query = Query::new("", "gpt-5").with_prompts(vec!["hi".to_owned()]);
            let error = provider(&server.uri())
                .generate(&query, &Options::default())
                .await
                .unwrap_err();
            assert!(matches!(error, Error::InvalidResponse(_)), "{reply}: {error}");
        }
    }
}
