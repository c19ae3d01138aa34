use std::env;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use sqirvy_core::{Error, ProviderSettings, Result};

/// Keys shorter than this are rejected before any request is made.
pub const MIN_API_KEY_LEN: usize = 20;

/// Builds the HTTP client shared by every request of one adapter.
pub fn build_client(settings: &ProviderSettings) -> Result<Client> {
    Ok(Client::builder()
        .timeout(settings.request_timeout())
        .build()?)
}

/// Reads an API key from `env_key`.
pub fn api_key_from_env(env_key: &str) -> Result<String> {
    env::var(env_key)
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| Error::MissingApiKey(format!("{env_key} environment variable not set")))
}

/// Rejects empty or implausibly short keys.
pub fn check_key_length(env_key: &str, api_key: &str) -> Result<()> {
    if api_key.is_empty() {
        return Err(Error::MissingApiKey(env_key.to_owned()));
    }
    if api_key.len() < MIN_API_KEY_LEN {
        return Err(Error::InvalidApiKey(format!(
            "{env_key}: key appears to be too short"
        )));
    }
    Ok(())
}

/// Sends `request` and decodes a successful JSON body into `T`.
///
/// Non-success statuses become [`Error::Provider`] carrying the response body.
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder, vendor: &str) -> Result<T> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(Error::Provider(format!(
            "{vendor} API request failed with status {status}: {error_text}"
        )));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|err| {
        Error::InvalidResponse(format!("failed to parse {vendor} response: {err}"))
    })
}
