//! Configuration management for sqirvy-cli
//!
//! Settings are layered: command-line flags, then `SQIRVY_*` environment
//! variables, then the TOML config file, then built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqirvy_core::{Error, Options, ProviderSettings, Result};

use crate::cli::GlobalArgs;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
/// Prompt sent when there is no other input.
pub const DEFAULT_PROMPT: &str = "Hello";
/// Default budget for stdin, files and scraped pages combined (256 KiB).
pub const MAX_INPUT_TOTAL_BYTES: u64 = 262_144;

const ENV_MODEL: &str = "SQIRVY_MODEL";
const ENV_TEMPERATURE: &str = "SQIRVY_TEMPERATURE";
const ENV_DEFAULT_PROMPT: &str = "SQIRVY_DEFAULT_PROMPT";

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model name or alias.
    pub model: String,
    /// Sampling temperature on a 0.0 to 1.0 scale.
    pub temperature: f32,
    /// Prompt sent when stdin, files and URLs are all absent.
    pub default_prompt: String,
    /// Byte budget for all assembled input.
    pub max_input_bytes: u64,
    /// Skip the private-address check for URL inputs.
    pub allow_private_urls: bool,
    /// Provider endpoints and timeout.
    pub providers: ProviderSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            default_prompt: DEFAULT_PROMPT.to_owned(),
            max_input_bytes: MAX_INPUT_TOTAL_BYTES,
            allow_private_urls: false,
            providers: ProviderSettings::default(),
        }
    }
}

impl Config {
    /// Get the default config file path (`~/.config/sqirvy-cli/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("could not determine home directory".to_owned()))?;
        Ok(home.join(".config").join("sqirvy-cli").join("config.toml"))
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|error| {
            Error::Config(format!("failed to read config {}: {error}", path.display()))
        })?;
        toml::from_str(&contents).map_err(|error| {
            Error::Config(format!("failed to parse config {}: {error}", path.display()))
        })
    }

    /// Loads the explicit config file, or the default one if it exists.
    ///
    /// # Errors
    /// Returns an error if an explicit file is missing, or any file found
    /// cannot be parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Ok(path) if path.is_file() => path,
                Ok(_) => return Ok(Self::default()),
                Err(error) => {
                    tracing::debug!("skipping default config: {error}");
                    return Ok(Self::default());
                }
            },
        };

        let config = Self::load_from_file(&path)?;
        tracing::debug!("Config file : {}", path.display());
        Ok(config)
    }

    /// Applies `SQIRVY_*` overrides read through `lookup`. Blank values are ignored.
    ///
    /// # Errors
    /// Returns an error if `SQIRVY_TEMPERATURE` is not a number.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(model) = read(ENV_MODEL) {
            self.model = model;
        }
        if let Some(raw) = read(ENV_TEMPERATURE) {
            self.temperature = raw.trim().parse().map_err(|error| {
                Error::Config(format!("invalid {ENV_TEMPERATURE} value {raw:?}: {error}"))
            })?;
        }
        if let Some(prompt) = read(ENV_DEFAULT_PROMPT) {
            self.default_prompt = prompt;
        }
        Ok(())
    }

    /// Applies command-line flags, which take precedence over everything else.
    pub fn apply_args(&mut self, args: &GlobalArgs) {
        if let Some(model) = &args.model {
            self.model.clone_from(model);
        }
        if let Some(temperature) = args.temperature {
            self.temperature = temperature;
        }
        if let Some(prompt) = &args.default_prompt {
            self.default_prompt.clone_from(prompt);
        }
    }

    /// Checks the merged settings.
    ///
    /// # Errors
    /// Returns an error if the temperature is outside 0.0 to 1.0, the model
    /// or default prompt is blank, or the input budget is zero.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be between 0.0 and 1.0, got {}",
                self.temperature
            )));
        }
        if self.model.trim().is_empty() {
            return Err(Error::Config("model cannot be empty".to_owned()));
        }
        if self.default_prompt.trim().is_empty() {
            return Err(Error::Config("default prompt cannot be empty".to_owned()));
        }
        if self.max_input_bytes == 0 {
            return Err(Error::Config(
                "max_input_bytes must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    /// Builds the final configuration for this process: file, then process
    /// environment, then `args`.
    ///
    /// # Errors
    /// Returns an error if loading, an override or validation fails.
    pub fn resolve(args: &GlobalArgs) -> Result<Self> {
        let mut config = Self::load(args.config.as_deref())?;
        config.apply_env(|key| env::var(key).ok())?;
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    /// Generation options; a zero token limit lets each model use its registry maximum.
    pub const fn options(&self) -> Options {
        Options {
            temperature: self.temperature,
            max_tokens: 0,
        }
    }
}
