//! Mock provider for testing prompt assembly and dispatch.
//!
//! Returns canned responses for matching prompts and records every query it
//! receives, so callers can be tested without real API calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use sqirvy_core::{Error, ModelProvider, Options, Query, Response, Result, TokenUsage};

/// Locks `mutex`, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock provider that returns pre-defined responses based on prompt patterns.
#[derive(Clone, Default)]
pub struct MockProvider {
    /// Predefined responses keyed by pattern.
    responses: Arc<Mutex<HashMap<String, String>>>,
    /// Response used when no pattern matches.
    default_response: Arc<Mutex<Option<String>>>,
    /// Error message returned instead of a response, if set.
    failure: Arc<Mutex<Option<String>>>,
    /// Every query received, in order.
    call_history: Arc<Mutex<Vec<(Query, Options)>>>,
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern-based response; a query matches if any prompt contains the pattern.
    #[must_use]
    pub fn with_response(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        lock(&self.responses).insert(pattern.into(), response.into());
        self
    }

    /// Set a default response for queries that don't match any pattern.
    #[must_use]
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        *lock(&self.default_response) = Some(response.into());
        self
    }

    /// Make every call fail with a provider error.
    #[must_use]
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        *lock(&self.failure) = Some(message.into());
        self
    }

    /// Get the call history.
    #[must_use]
    pub fn calls(&self) -> Vec<(Query, Options)> {
        lock(&self.call_history).clone()
    }

    /// Get the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.call_history).len()
    }

    fn find_response(&self, query: &Query) -> Option<String> {
        let responses = lock(&self.responses);
        responses
            .iter()
            .find(|(pattern, _)| {
                query
                    .prompts
                    .iter()
                    .any(|prompt| prompt.contains(pattern.as_str()))
            })
            .map(|(_, response)| response.clone())
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn supports_model(&self, _model: &str) -> bool {
        true
    }

    async fn generate(&self, query: &Query, options: &Options) -> Result<Response> {
        lock(&self.call_history).push((query.clone(), *options));
        query.validate()?;

        if let Some(message) = lock(&self.failure).clone() {
            return Err(Error::Provider(message));
        }

        let text = self.find_response(query).unwrap_or_else(|| {
            lock(&self.default_response)
                .clone()
                .unwrap_or_else(|| format!("Mock response for model: {}", query.model))
        });

        Ok(Response {
            text,
            tokens_used: TokenUsage {
                input: query.prompts.iter().map(|prompt| prompt.len() as u64).sum(),
                output: 0,
            },
            provider: self.name().to_owned(),
            model: query.model.clone(),
            latency_ms: 0,
        })
    }
}
