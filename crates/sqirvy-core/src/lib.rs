//! Core types and traits for the sqirvy LLM client.
//!
//! This crate provides the error type, the provider-neutral request and
//! response types, the [`ModelProvider`] trait every vendor adapter
//! implements, and the static model registry used to route a model name to
//! its provider.
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

/// Provider connection settings.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Static model registry and alias resolution.
pub mod models;
/// Trait definitions for model providers.
pub mod traits;
/// Core data types for queries, options and responses.
pub mod types;

pub use config::ProviderSettings;
pub use error::{Error, Result};
pub use models::{
    DEFAULT_MAX_TOKENS, ModelInfo, ModelProviderPair, Provider, max_tokens, max_tokens_checked,
    model_list, model_provider_list, provider_for, resolve_alias,
};
pub use traits::ModelProvider;
pub use types::{Options, Query, Response, TokenUsage};
