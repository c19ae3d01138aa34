//! Provider adapters for the hosted LLM services.
//!
//! Each adapter speaks its vendor's HTTP API directly through `reqwest` and
//! exposes it behind [`sqirvy_core::ModelProvider`]. [`create_provider`] picks
//! the adapter for a [`Provider`].
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        reason = "Allow for tests"
    )
)]

/// Anthropic Messages API adapter.
pub mod anthropic;
/// Google Gemini `generateContent` adapter.
pub mod gemini;
/// Shared HTTP plumbing.
mod http;
/// Mock provider for tests.
pub mod mock;
/// `OpenAI` chat completions adapter, also used for compatible endpoints.
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;

use sqirvy_core::{Error, ModelProvider, Provider, ProviderSettings, Result};

/// Creates the adapter for `provider`, reading its API key from the environment.
///
/// # Errors
/// Returns an error if the API key is missing or malformed, or the HTTP client
/// cannot be built.
pub fn create_provider(
    provider: Provider,
    settings: &ProviderSettings,
) -> Result<Box<dyn ModelProvider>> {
    let created: Result<Box<dyn ModelProvider>> = match provider {
        Provider::Anthropic => AnthropicProvider::from_env(settings)
            .map(|client| -> Box<dyn ModelProvider> { Box::new(client) }),
        Provider::Gemini => GeminiProvider::from_env(settings)
            .map(|client| -> Box<dyn ModelProvider> { Box::new(client) }),
        Provider::OpenAi => OpenAiProvider::from_env(settings)
            .map(|client| -> Box<dyn ModelProvider> { Box::new(client) }),
    };
    created.map_err(|err| {
        Error::Provider(format!(
            "failed to create client for provider {provider}: {err}"
        ))
    })
}
