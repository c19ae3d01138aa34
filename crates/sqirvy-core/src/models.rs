use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Output token limit used for models missing from the registry.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Hosted LLM vendors reachable through this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Anthropic Claude models.
    Anthropic,
    /// Google Gemini models.
    Gemini,
    /// `OpenAI`, and any endpoint speaking its chat completions API.
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    /// Canonical lowercase provider name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            _ => Err(Error::UnsupportedProvider(name.to_owned())),
        }
    }
}

/// Registry entry for a supported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// Full model identifier as sent to the vendor.
    pub name: &'static str,
    /// Vendor serving the model.
    pub provider: Provider,
    /// Largest completion the model may produce.
    pub max_output_tokens: u32,
}

/// Model and provider pair, used for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProviderPair {
    /// Model identifier.
    pub model: String,
    /// Provider serving the model.
    pub provider: Provider,
}

/// Single source of truth for model routing and token limits.
const MODEL_REGISTRY: &[ModelInfo] = &[
    // anthropic
    ModelInfo {
        name: "claude-sonnet-4-20250514",
        provider: Provider::Anthropic,
        max_output_tokens: 64_000,
    },
    ModelInfo {
        name: "claude-opus-4-1-20250805",
        provider: Provider::Anthropic,
        max_output_tokens: 32_000,
    },
    ModelInfo {
        name: "claude-3-5-haiku-20241022",
        provider: Provider::Anthropic,
        max_output_tokens: 8_096,
    },
    // gemini
    ModelInfo {
        name: "gemini-2.5-pro",
        provider: Provider::Gemini,
        max_output_tokens: 64_000,
    },
    ModelInfo {
        name: "gemini-2.5-flash",
        provider: Provider::Gemini,
        max_output_tokens: 64_000,
    },
    // openai
    ModelInfo {
        name: "gpt-5",
        provider: Provider::OpenAi,
        max_output_tokens: 64_000,
    },
    ModelInfo {
        name: "gpt-5-mini",
        provider: Provider::OpenAi,
        max_output_tokens: 64_000,
    },
];

/// Short names accepted on the command line.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("claude-sonnet-4", "claude-sonnet-4-20250514"),
    ("claude-opus-4-1", "claude-opus-4-1-20250805"),
    ("claude-3-5-haiku", "claude-3-5-haiku-20241022"),
];

fn lookup(model: &str) -> Option<&'static ModelInfo> {
    MODEL_REGISTRY.iter().find(|info| info.name == model)
}

/// Returns the full model name for an alias, or the input unchanged.
pub fn resolve_alias(model: &str) -> &str {
    MODEL_ALIASES
        .iter()
        .find(|&&(alias, _)| alias == model)
        .map_or(model, |&(_, target)| target)
}

/// Lists every registered model name.
pub fn model_list() -> Vec<&'static str> {
    MODEL_REGISTRY.iter().map(|info| info.name).collect()
}

/// Lists every registered model with its provider.
pub fn model_provider_list() -> Vec<ModelProviderPair> {
    MODEL_REGISTRY
        .iter()
        .map(|info| ModelProviderPair {
            model: info.name.to_owned(),
            provider: info.provider,
        })
        .collect()
}

/// Looks up the provider serving `model`.
///
/// # Errors
/// Returns [`Error::UnknownModel`] if the model is not registered.
pub fn provider_for(model: &str) -> Result<Provider> {
    lookup(model)
        .map(|info| info.provider)
        .ok_or_else(|| Error::UnknownModel(model.to_owned()))
}

/// Looks up the output token limit for `model`.
///
/// # Errors
/// Returns [`Error::UnknownModel`] if the model is not registered.
pub fn max_tokens_checked(model: &str) -> Result<u32> {
    lookup(model)
        .map(|info| info.max_output_tokens)
        .ok_or_else(|| Error::UnknownModel(format!("{model}, using default token limit")))
}

/// Output token limit for `model`, falling back to [`DEFAULT_MAX_TOKENS`].
pub fn max_tokens(model: &str) -> u32 {
    max_tokens_checked(model).unwrap_or(DEFAULT_MAX_TOKENS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_for_registered_models() {
        let cases = [
            ("claude-sonnet-4-20250514", Provider::Anthropic),
            ("claude-opus-4-1-20250805", Provider::Anthropic),
            ("claude-3-5-haiku-20241022", Provider::Anthropic),
            ("gemini-2.5-pro", Provider::Gemini),
            ("gemini-2.5-flash", Provider::Gemini),
            ("gpt-5", Provider::OpenAi),
            ("gpt-5-mini", Provider::OpenAi),
        ];
        for (model, expected) in cases {
            assert_eq!(provider_for(model).ok(), Some(expected), "model {model}");
        }
    }

    #[test]
    fn test_provider_for_unknown_model() {
        let result = provider_for("invalid-model");
        assert!(matches!(result, Err(Error::UnknownModel(ref name)) if name == "invalid-model"));
    }

    #[test]
    fn test_max_tokens() {
        assert_eq!(max_tokens("claude-opus-4-1-20250805"), 32_000);
        assert_eq!(max_tokens("claude-3-5-haiku-20241022"), 8_096);
        assert_eq!(max_tokens("gemini-2.5-flash"), 64_000);
        assert_eq!(max_tokens("llama3.3"), DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_max_tokens_checked_reports_unknown() {
        assert_eq!(max_tokens_checked("gpt-5").ok(), Some(64_000));
        let error = max_tokens_checked("unknown").unwrap_err();
        assert_eq!(
            error.to_string(),
            "unrecognized model: unknown, using default token limit"
        );
    }

    #[test]
    fn test_resolve_alias() {
        assert_eq!(resolve_alias("claude-sonnet-4"), "claude-sonnet-4-20250514");
        assert_eq!(resolve_alias("claude-opus-4-1"), "claude-opus-4-1-20250805");
        assert_eq!(resolve_alias("claude-3-5-haiku"), "claude-3-5-haiku-20241022");
        assert_eq!(resolve_alias("gpt-5"), "gpt-5");
        assert_eq!(resolve_alias("my-local-model"), "my-local-model");
    }

    #[test]
    fn test_aliases_point_at_registered_models() {
        for (alias, target) in MODEL_ALIASES {
            assert!(lookup(target).is_some(), "alias {alias} targets unknown {target}");
        }
    }

    #[test]
    fn test_registry_limits_are_positive() {
        for info in MODEL_REGISTRY {
            assert!(info.max_output_tokens > 0, "{} has no limit", info.name);
        }
    }

    #[test]
    fn test_model_lists_match_registry() {
        let models = model_list();
        assert_eq!(models.len(), MODEL_REGISTRY.len());
        assert!(models.contains(&"gemini-2.5-pro"));

        let pairs = model_provider_list();
        assert_eq!(pairs.len(), MODEL_REGISTRY.len());
        assert!(pairs.contains(&ModelProviderPair {
            model: "gpt-5-mini".to_owned(),
            provider: Provider::OpenAi,
        }));
    }

    #[test]
    fn test_provider_name_round_trip() {
        for provider in [Provider::Anthropic, Provider::Gemini, Provider::OpenAi] {
            let parsed: Provider = provider.to_string().parse().unwrap();
            assert_eq!(parsed, provider);
        }
        assert_eq!("OpenAI".parse::<Provider>().ok(), Some(Provider::OpenAi));
        assert!(matches!(
            "mistral".parse::<Provider>(),
            Err(Error::UnsupportedProvider(_))
        ));
    }
}
