use async_trait::async_trait;

use crate::{Options, Query, Response, Result};

/// Uniform interface over the hosted LLM vendors.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the canonical provider name (`anthropic`, `gemini`, `openai`).
    fn name(&self) -> &'static str;

    /// Whether this provider accepts `model`.
    fn supports_model(&self, model: &str) -> bool;

    /// Sends the system prompt and every user prompt of `query`, returning the
    /// concatenated text of the completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the query has no prompts, the model is not served by
    /// this provider, the request fails, or the response cannot be parsed.
    async fn generate(&self, query: &Query, options: &Options) -> Result<Response>;
}
