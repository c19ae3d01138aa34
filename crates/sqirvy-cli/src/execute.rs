//! Sends one assembled query to the provider serving the configured model.

use sqirvy_core::{ModelProvider, Provider, Query, Result, provider_for, resolve_alias};

use crate::config::Config;
use crate::input::{PageScraper, PromptAssembler};

/// Resolves the model, assembles prompts from `stdin` and `args`, and returns
/// the model's reply.
///
/// `connect` builds the client for the chosen provider. Models missing from
/// the registry are sent to the `OpenAI` adapter, which also serves
/// compatible endpoints.
///
/// # Errors
/// Returns an error if prompt assembly, client creation or the request fails.
pub async fn execute_query<S, F>(
    config: &Config,
    system_prompt: &str,
    args: &[String],
    stdin: Option<String>,
    scraper: S,
    connect: F,
) -> Result<String>
where
    S: PageScraper,
    F: FnOnce(Provider) -> Result<Box<dyn ModelProvider>> + Send,
{
    let model = resolve_alias(&config.model);
    tracing::info!("Using model : {model}");

    let prompts = PromptAssembler::from_config(scraper, config)
        .assemble(stdin, args)
        .await?;

    let provider = provider_for(model).unwrap_or_else(|error| {
        tracing::warn!("{error}; assuming an OpenAI-compatible provider");
        Provider::OpenAi
    });
    let client = connect(provider)?;

    let query = Query::new(system_prompt, model).with_prompts(prompts);
    let response = client.generate(&query, &config.options()).await?;
    tracing::debug!(
        provider = %response.provider,
        input_tokens = response.tokens_used.input,
        output_tokens = response.tokens_used.output,
        latency_ms = response.latency_ms,
        "query complete"
    );

    Ok(response.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sqirvy_core::Error;
    use sqirvy_providers::MockProvider;

    /// Scraper that must never be reached.
    struct NoScraper;

    #[async_trait]
    impl PageScraper for NoScraper {
        async fn scrape(&self, url: &str) -> Result<String> {
            Err(Error::Other(format!("unexpected scrape of {url}")))
        }
    }

    fn config(model: &str) -> Config {
        Config {
            model: model.to_owned(),
            temperature: 0.25,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_execute_query_resolves_alias_and_provider() {
        let mock = MockProvider::new().with_response("Hello", "Hi!");
        let handle = mock.clone();
        let mut selected = None;

        let text = execute_query(
            &config("claude-3-5-haiku"),
            "system prompt",
            &[],
            None,
            NoScraper,
            |provider| {
                selected = Some(provider);
                Ok(Box::new(mock))
            },
        )
        .await
        .unwrap();

        assert_eq!(text, "Hi!");
        assert_eq!(selected, Some(Provider::Anthropic));

        let calls = handle.calls();
        assert_eq!(calls.len(), 1);
        let (query, options) = &calls[0];
        assert_eq!(query.model, "claude-3-5-haiku-20241022");
        assert_eq!(query.system, "system prompt");
        assert_eq!(query.prompts, vec!["Hello"]);
        assert!((options.temperature - 0.25).abs() < f32::EPSILON);
        assert_eq!(options.effective_max_tokens(&query.model), 8_096);
    }

    #[tokio::test]
    async fn test_execute_query_unregistered_model_falls_back_to_openai() {
        let mock = MockProvider::new();
        let mut selected = None;

        let text = execute_query(
            &config("llama3.3:70b"),
            "",
            &[],
            Some("```stdin\nhi```".to_owned()),
            NoScraper,
            |provider| {
                selected = Some(provider);
                Ok(Box::new(mock))
            },
        )
        .await
        .unwrap();

        assert_eq!(selected, Some(Provider::OpenAi));
        assert_eq!(text, "Mock response for model: llama3.3:70b");
    }

    #[tokio::test]
    async fn test_execute_query_propagates_client_errors() {
        let error = execute_query(&config("gpt-5"), "", &[], None, NoScraper, |_| {
            Err(Error::MissingApiKey(
                "OPENAI_API_KEY environment variable not set".to_owned(),
            ))
        })
        .await
        .unwrap_err();
        assert!(error.is_auth_error());
    }

    #[tokio::test]
    async fn test_execute_query_input_errors_skip_provider() {
        let mut connected = false;
        let error = execute_query(
            &config("gpt-5"),
            "",
            &["/no/such/input.txt".to_owned()],
            None,
            NoScraper,
            |_| {
                connected = true;
                Ok(Box::new(MockProvider::new()))
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(error, Error::FileNotFound(_)));
        assert!(!connected);
    }

    #[tokio::test]
    async fn test_execute_query_provider_failure() {
        let mock = MockProvider::new().with_failure("rate limited");
        let error = execute_query(&config("gemini-2.5-pro"), "", &[], None, NoScraper, |_| {
            Ok(Box::new(mock))
        })
        .await
        .unwrap_err();
        assert!(error.is_retryable());
    }
}
