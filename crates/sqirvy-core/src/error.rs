use core::result::Result as CoreResult;
use std::io::Error as IoError;

use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;

/// Result type for sqirvy operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur while assembling prompts or talking to a provider.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// An HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A model provider encountered an error.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Required API key was not found.
    #[error("API key not found: {0}")]
    MissingApiKey(String),

    /// API key is present but malformed.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    /// Model is not present in the registry.
    #[error("unrecognized model: {0}")]
    UnknownModel(String),

    /// Model is not served by the provider it was sent to.
    #[error("{0}")]
    UnsupportedModel(String),

    /// Provider name is not one of the supported providers.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Request parameters are invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model provider returned an invalid response.
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    /// Combined prompt input exceeds the byte budget.
    #[error("total size would exceed limit of {limit} bytes{source_hint}")]
    InputTooLarge {
        /// Byte budget that was exceeded.
        limit: u64,
        /// Optional suffix naming the input kind, e.g. ` (files)`.
        source_hint: String,
    },

    /// The specified file does not exist.
    #[error("file does not exist: {0}")]
    FileNotFound(String),

    /// The path could not be normalized or its links resolved.
    #[error("unsafe or invalid path specification {path}: {reason}")]
    InvalidPath {
        /// Path as given by the user.
        path: String,
        /// Underlying failure.
        reason: String,
    },

    /// Fetching or parsing a web page failed.
    #[error("failed to scrape URL {url}: {reason}")]
    Scrape {
        /// URL being scraped.
        url: String,
        /// Underlying failure.
        reason: String,
    },

    /// A URL resolved to an address that must not be fetched.
    #[error("URL {url} resolves to a non-public IP address {address}, potential SSRF detected")]
    NonPublicAddress {
        /// URL as given by the user.
        url: String,
        /// Offending resolved address.
        address: String,
    },

    /// A general error not covered by other variants.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Builds an [`Error::InputTooLarge`] without a source hint.
    pub fn input_too_large(limit: u64) -> Self {
        Self::InputTooLarge {
            limit,
            source_hint: String::new(),
        }
    }

    /// Builds an [`Error::InputTooLarge`] naming the kind of input that overflowed.
    pub fn input_too_large_from(limit: u64, kind: &str) -> Self {
        Self::InputTooLarge {
            limit,
            source_hint: format!(" ({kind})"),
        }
    }

    /// Determines whether this error may succeed if retried.
    ///
    /// Returns `true` for transient errors like network failures or provider errors.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Provider(_))
    }

    /// Returns `true` when the failure is caused by a missing or malformed credential.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::MissingApiKey(_) | Self::InvalidApiKey(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value as JsonValue, from_str};
    use std::io;

    #[test]
    fn test_error_display() {
        let error1 = Error::Config("invalid config".to_owned());
        assert_eq!(error1.to_string(), "Configuration error: invalid config");

        let error2 = Error::Provider("model failed".to_owned());
        assert_eq!(error2.to_string(), "Provider error: model failed");

        let error3 = Error::MissingApiKey("OPENAI_API_KEY".to_owned());
        assert_eq!(error3.to_string(), "API key not found: OPENAI_API_KEY");

        let error4 = Error::UnknownModel("gpt-0".to_owned());
        assert_eq!(error4.to_string(), "unrecognized model: gpt-0");
    }

    #[test]
    fn test_input_too_large_display() {
        assert_eq!(
            Error::input_too_large(1024).to_string(),
            "total size would exceed limit of 1024 bytes"
        );
        assert_eq!(
            Error::input_too_large_from(262_144, "files").to_string(),
            "total size would exceed limit of 262144 bytes (files)"
        );
    }

    #[test]
    fn test_ssrf_display() {
        let error = Error::NonPublicAddress {
            url: "http://localhost/".to_owned(),
            address: "127.0.0.1".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "URL http://localhost/ resolves to a non-public IP address 127.0.0.1, potential SSRF detected"
        );
    }

    #[test]
    fn test_error_is_retryable() {
        let error1 = Error::Provider("timeout".to_owned());
        assert!(error1.is_retryable());

        let error2 = Error::Config("bad config".to_owned());
        assert!(!error2.is_retryable());

        let error3 = Error::MissingApiKey("KEY".to_owned());
        assert!(!error3.is_retryable());

        let error4 = Error::FileNotFound("test.txt".to_owned());
        assert!(!error4.is_retryable());
    }

    #[test]
    fn test_error_is_auth_error() {
        assert!(Error::MissingApiKey("GEMINI_API_KEY".to_owned()).is_auth_error());
        assert!(Error::InvalidApiKey("too short".to_owned()).is_auth_error());
        assert!(!Error::Provider("boom".to_owned()).is_auth_error());
    }

    #[test]
    fn test_error_from_io() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = from_str::<JsonValue>("invalid json").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }
}
