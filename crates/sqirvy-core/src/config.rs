//! Connection settings shared by the provider adapters.

use core::time::Duration;
use std::env;

use serde::{Deserialize, Serialize};

use crate::Provider;

/// Env var overriding the Anthropic endpoint.
pub const ENV_ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";
/// Env var overriding the `OpenAI` endpoint.
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
/// Env var overriding the Gemini endpoint.
pub const ENV_GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";

/// Default Anthropic endpoint.
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
/// Default `OpenAI` endpoint.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default Gemini endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Provider endpoint overrides and request timeout (`[providers]` in the config file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Anthropic base URL override.
    pub anthropic_base_url: Option<String>,
    /// `OpenAI` (or compatible) base URL override.
    pub openai_base_url: Option<String>,
    /// Gemini base URL override.
    pub gemini_base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            anthropic_base_url: None,
            openai_base_url: None,
            gemini_base_url: None,
            request_timeout_secs: 120,
        }
    }
}

impl ProviderSettings {
    /// Request timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolves the base URL for `provider`: environment, then config, then vendor default.
    pub fn base_url(&self, provider: Provider) -> String {
        let (env_key, configured, default) = match provider {
            Provider::Anthropic => (
                ENV_ANTHROPIC_BASE_URL,
                self.anthropic_base_url.as_deref(),
                DEFAULT_ANTHROPIC_BASE_URL,
            ),
            Provider::Gemini => (
                ENV_GEMINI_BASE_URL,
                self.gemini_base_url.as_deref(),
                DEFAULT_GEMINI_BASE_URL,
            ),
            Provider::OpenAi => (
                ENV_OPENAI_BASE_URL,
                self.openai_base_url.as_deref(),
                DEFAULT_OPENAI_BASE_URL,
            ),
        };
        resolve_base_url(env::var(env_key).ok(), configured, default)
    }
}

fn resolve_base_url(from_env: Option<String>, configured: Option<&str>, default: &str) -> String {
    from_env
        .filter(|value| !value.trim().is_empty())
        .or_else(|| configured.map(str::to_owned))
        .unwrap_or_else(|| default.to_owned())
        .trim_end_matches('/')
        .to_owned()
}
