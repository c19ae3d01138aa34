//! Prompt assembly from stdin, files and web pages under a byte budget.
//!
//! Every source is wrapped in `--- START … ---` / `--- END … ---` markers so
//! the model can tell inputs apart.

mod guard;
mod scraper;

use std::io::{self, IsTerminal as _, Read};
use std::path::{Path, PathBuf};

use sqirvy_core::{Error, Result};
use tokio::fs;
use tokio::io::AsyncReadExt as _;
use url::Url;

use crate::config::Config;

pub use guard::{check_addresses, ensure_public_url, is_non_public, resolve_public};
pub use scraper::{HtmlScraper, PageScraper, extract_text, scrape_all};

/// A positional argument, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// An absolute `http` or `https` URL.
    Url(Url),
    /// Anything else, read as a file path.
    File(PathBuf),
}

/// Treats `arg` as a URL only if it parses as an absolute `http(s)` URL.
pub fn classify(arg: &str) -> Input {
    Url::parse(arg)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map_or_else(|| Input::File(PathBuf::from(arg)), Input::Url)
}

/// Reads all of `reader`, returning the data fenced as a `stdin` block, or
/// `None` if there was nothing to read.
///
/// # Errors
/// Returns an error if reading fails or more than `max_bytes` are available.
pub fn read_stdin<R: Read>(reader: R, max_bytes: u64) -> Result<Option<String>> {
    let mut data = Vec::new();
    reader.take(max_bytes.saturating_add(1)).read_to_end(&mut data)?;
    if data.len() as u64 > max_bytes {
        return Err(Error::input_too_large(max_bytes));
    }
    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(format!("```stdin\n{}```", String::from_utf8_lossy(&data))))
}

/// Reads the process stdin when it is redirected; an interactive terminal yields `None`.
///
/// # Errors
/// See [`read_stdin`].
pub fn read_process_stdin(max_bytes: u64) -> Result<Option<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    read_stdin(stdin.lock(), max_bytes)
}

/// Reads a file after resolving links, refusing anything larger than `max_bytes`.
///
/// # Errors
/// Returns an error if the path cannot be resolved, does not exist, is not
/// a regular file, or exceeds the limit.
pub async fn read_file(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let shown = path.display().to_string();
    let resolved = fs::canonicalize(path).await.map_err(|error| {
        if error.kind() == io::ErrorKind::NotFound {
            Error::FileNotFound(shown.clone())
        } else {
            Error::InvalidPath {
                path: shown.clone(),
                reason: error.to_string(),
            }
        }
    })?;

    let metadata = fs::metadata(&resolved).await?;
    if !metadata.is_file() {
        return Err(Error::InvalidPath {
            path: shown,
            reason: "not a regular file".to_owned(),
        });
    }
    if metadata.len() > max_bytes {
        return Err(Error::input_too_large(max_bytes));
    }

    // The file may grow between stat and read.
    let file = fs::File::open(&resolved).await?;
    let mut content = Vec::with_capacity(metadata.len() as usize);
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut content)
        .await?;
    if content.len() as u64 > max_bytes {
        return Err(Error::input_too_large(max_bytes));
    }
    Ok(content)
}

/// Running total of assembled bytes.
struct Budget {
    used: u64,
    limit: u64,
}

impl Budget {
    fn charge(&mut self, block: &str, kind: &str) -> Result<()> {
        self.used = self.used.saturating_add(block.len() as u64);
        if self.used > self.limit {
            return Err(Error::input_too_large_from(self.limit, kind));
        }
        Ok(())
    }
}

/// Builds the prompt list for one query.
pub struct PromptAssembler<S> {
    scraper: S,
    max_bytes: u64,
    default_prompt: String,
    allow_private_urls: bool,
}

impl<S: PageScraper> PromptAssembler<S> {
    /// Creates an assembler with the default budget and prompt.
    pub fn new(scraper: S) -> Self {
        Self {
            scraper,
            max_bytes: crate::config::MAX_INPUT_TOTAL_BYTES,
            default_prompt: crate::config::DEFAULT_PROMPT.to_owned(),
            allow_private_urls: false,
        }
    }

    /// Creates an assembler using the budget, default prompt and URL policy of `config`.
    pub fn from_config(scraper: S, config: &Config) -> Self {
        Self::new(scraper)
            .with_max_bytes(config.max_input_bytes)
            .with_default_prompt(config.default_prompt.clone())
            .with_private_urls(config.allow_private_urls)
    }

    /// Sets the byte budget.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Sets the prompt used when there is no input.
    #[must_use]
    pub fn with_default_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.default_prompt = prompt.into();
        self
    }

    /// Allows URLs that resolve to private addresses.
    #[must_use]
    pub const fn with_private_urls(mut self, allow: bool) -> Self {
        self.allow_private_urls = allow;
        self
    }

    /// The byte budget.
    pub const fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Assembles stdin content followed by each argument in order.
    ///
    /// # Errors
    /// Returns an error if any source fails to load, a URL is refused, or the
    /// running total exceeds the budget.
    pub async fn assemble(&self, stdin: Option<String>, args: &[String]) -> Result<Vec<String>> {
        let mut budget = Budget {
            used: 0,
            limit: self.max_bytes,
        };
        let mut prompts = Vec::with_capacity(args.len() + 1);

        if let Some(data) = stdin {
            let block = format!("--- START STDIN ---\n{data}\n--- END STDIN ---");
            budget.charge(&block, "stdin")?;
            prompts.push(block);
        }

        for arg in args {
            let block = match classify(arg) {
                Input::Url(url) => {
                    if !self.allow_private_urls {
                        ensure_public_url(&url).await?;
                    }
                    let page = self.scraper.scrape(arg).await?;
                    let block = format!("--- START URL: {arg} ---\n{page}\n--- END URL: {arg} ---");
                    budget.charge(&block, "urls")?;
                    block
                }
                Input::File(path) => {
                    let content = read_file(&path, self.max_bytes).await?;
                    let block = format!(
                        "--- START FILE: {arg} ---\n{}\n--- END FILE: {arg} ---",
                        String::from_utf8_lossy(&content)
                    );
                    budget.charge(&block, "files")?;
                    block
                }
            };
            tracing::debug!(source = %arg, bytes = block.len(), "added input");
            prompts.push(block);
        }

        if prompts.is_empty() {
            prompts.push(self.default_prompt.clone());
        }
        Ok(prompts)
    }
}
