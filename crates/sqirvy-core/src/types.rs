use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A text query: one system prompt followed by user prompts, for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// System prompt sent ahead of the user prompts.
    pub system: String,
    /// User prompts, sent in order.
    pub prompts: Vec<String>,
    /// Model identifier.
    pub model: String,
}

impl Query {
    /// Creates a query for `model` with the given system prompt and no user prompts.
    pub fn new<S: Into<String>, M: Into<String>>(system: S, model: M) -> Self {
        Self {
            system: system.into(),
            prompts: Vec::new(),
            model: model.into(),
        }
    }

    /// Replaces the user prompts.
    #[must_use]
    pub fn with_prompts(mut self, prompts: Vec<String>) -> Self {
        self.prompts = prompts;
        self
    }

    /// Checks the query can be sent.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRequest`] if there are no user prompts.
    pub fn validate(&self) -> Result<()> {
        if self.prompts.is_empty() {
            return Err(Error::InvalidRequest(
                "prompts cannot be empty for text query".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Generation options shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Sampling temperature on a 0.0 to 1.0 scale; providers rescale it.
    pub temperature: f32,
    /// Maximum number of tokens in the completion.
    pub max_tokens: u32,
}

impl Options {
    /// Token limit to send for `model`.
    ///
    /// Registered models are capped at their registry limit; zero means "use
    /// the model's limit". Unregistered models get the caller's value, or
    /// [`crate::DEFAULT_MAX_TOKENS`] when it is zero.
    pub fn effective_max_tokens(&self, model: &str) -> u32 {
        let limit = crate::max_tokens(model);
        match (self.max_tokens, crate::max_tokens_checked(model)) {
            (0, _) => limit,
            (requested, Ok(_)) => requested.min(limit),
            (requested, Err(_)) => requested,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: crate::DEFAULT_MAX_TOKENS,
        }
    }
}

/// Text response returned by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Concatenated text of every returned part.
    pub text: String,
    /// Token accounting reported by the vendor.
    pub tokens_used: TokenUsage,
    /// Provider that produced the response.
    pub provider: String,
    /// Model that produced the response.
    pub model: String,
    /// Wall-clock time of the request.
    pub latency_ms: u64,
}

/// Token counts for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub input: u64,
    /// Completion tokens.
    pub output: u64,
}

impl TokenUsage {
    /// Total tokens billed.
    pub const fn total(&self) -> u64 {
        self.input + self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = Query::new("be terse", "gpt-5")
            .with_prompts(vec!["one".to_owned(), "two".to_owned()]);
        assert_eq!(query.system, "be terse");
        assert_eq!(query.model, "gpt-5");
        assert_eq!(query.prompts, vec!["one", "two"]);
        query.validate().unwrap();
    }

    #[test]
    fn test_query_without_prompts_is_rejected() {
        let error = Query::new("system", "gpt-5").validate().unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid request: prompts cannot be empty for text query"
        );
    }

    #[test]
    fn test_effective_max_tokens() {
        let unset = Options {
            temperature: 0.5,
            max_tokens: 0,
        };
        assert_eq!(unset.effective_max_tokens("claude-3-5-haiku-20241022"), 8_096);
        assert_eq!(unset.effective_max_tokens("local-model"), crate::DEFAULT_MAX_TOKENS);

        let large = Options {
            temperature: 0.5,
            max_tokens: 100_000,
        };
        assert_eq!(large.effective_max_tokens("gpt-5"), 64_000);
        assert_eq!(large.effective_max_tokens("local-model"), 100_000);

        let small = Options {
            temperature: 0.5,
            max_tokens: 256,
        };
        assert_eq!(small.effective_max_tokens("gemini-2.5-pro"), 256);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            input: 12,
            output: 30,
        };
        assert_eq!(usage.total(), 42);
        assert_eq!(TokenUsage::default().total(), 0);
    }

    #[test]
    fn test_options_default() {
        let options = Options::default();
        assert!((options.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(options.max_tokens, crate::DEFAULT_MAX_TOKENS);
    }
}
