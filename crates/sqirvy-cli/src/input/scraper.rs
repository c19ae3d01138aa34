//! Web page text extraction for URL inputs.

use core::time::Duration;
use std::net::SocketAddr;

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use scraper::{ElementRef, Html, Selector};
use sqirvy_core::{Error, Result};
use url::Url;

use super::guard::resolve_public;
use crate::config::MAX_INPUT_TOTAL_BYTES;

/// Elements whose text never reaches the prompt.
const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];
/// Separator placed between pages by [`scrape_all`].
const PAGE_SEPARATOR: &str = "\n---\n";
const USER_AGENT: &str = concat!("sqirvy-cli/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;

/// Fetches a page and returns its text, fenced and labelled with the URL.
#[async_trait]
pub trait PageScraper: Send + Sync {
    /// Scrapes `url`.
    ///
    /// # Errors
    /// Returns an error if the URL is empty or invalid, or the page cannot be fetched.
    async fn scrape(&self, url: &str) -> Result<String>;
}

/// [`PageScraper`] backed by `reqwest` and the `scraper` HTML parser.
///
/// Redirects are followed by hand so every hop passes the address guard, and
/// each request connects to the addresses the guard resolved.
#[derive(Debug, Clone)]
pub struct HtmlScraper {
    timeout: Duration,
    max_bytes: u64,
    allow_private_urls: bool,
}

impl HtmlScraper {
    /// Creates a scraper whose requests time out after `timeout`. Private
    /// addresses are refused until [`Self::with_private_urls`] allows them.
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_bytes: MAX_INPUT_TOTAL_BYTES,
            allow_private_urls: false,
        }
    }

    /// Caps the size of a downloaded page.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Allows pages and redirect targets on private addresses.
    #[must_use]
    pub const fn with_private_urls(mut self, allow: bool) -> Self {
        self.allow_private_urls = allow;
        self
    }

    /// Addresses to connect to for `url`; empty when private URLs are allowed.
    async fn vet(&self, url: &Url) -> Result<Vec<SocketAddr>> {
        if self.allow_private_urls {
            return Ok(Vec::new());
        }
        resolve_public(url).await
    }

    /// Resolves a redirect `location` against `from` and vets the target.
    async fn next_hop(&self, from: &Url, location: &str) -> Result<(Url, Vec<SocketAddr>)> {
        let redirect_error = |reason: String| Error::Scrape {
            url: from.to_string(),
            reason,
        };
        let target = from
            .join(location)
            .map_err(|error| redirect_error(format!("invalid redirect to {location}: {error}")))?;
        if !matches!(target.scheme(), "http" | "https") {
            return Err(redirect_error(format!("refusing redirect to {target}")));
        }
        let pinned = self.vet(&target).await?;
        Ok((target, pinned))
    }

    fn client_for(&self, url: &Url, pinned: &[SocketAddr]) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .redirect(Policy::none());
        if let Some(domain) = url.domain().filter(|_| !pinned.is_empty()) {
            builder = builder.resolve_to_addrs(domain, pinned);
        }
        Ok(builder.build()?)
    }

    /// Reads the body, stopping as soon as it passes the size cap.
    async fn read_body(&self, mut response: Response) -> Result<Vec<u8>> {
        let too_large = || Error::input_too_large_from(self.max_bytes, "urls");
        if response
            .content_length()
            .is_some_and(|length| length > self.max_bytes)
        {
            return Err(too_large());
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_bytes {
                return Err(too_large());
            }
        }
        Ok(body)
    }
}

#[async_trait]
impl PageScraper for HtmlScraper {
    async fn scrape(&self, url: &str) -> Result<String> {
        if url.is_empty() {
            return Err(Error::InvalidRequest("URL cannot be empty".to_owned()));
        }
        let scrape_error = |reason: String| Error::Scrape {
            url: url.to_owned(),
            reason,
        };
        let mut target = Url::parse(url).map_err(|error| scrape_error(error.to_string()))?;
        let mut pinned = self.vet(&target).await?;

        let mut redirects = 0;
        let response = loop {
            let response = self
                .client_for(&target, &pinned)?
                .get(target.clone())
                .send()
                .await
                .map_err(|error| scrape_error(error.to_string()))?;
            if !response.status().is_redirection() {
                break response;
            }
            redirects += 1;
            if redirects > MAX_REDIRECTS {
                return Err(scrape_error(format!("stopped after {MAX_REDIRECTS} redirects")));
            }
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| {
                    scrape_error(format!("status {} without a location", response.status()))
                })?
                .to_owned();
            tracing::debug!(from = %target, to = %location, "following redirect");
            (target, pinned) = self.next_hop(&target, &location).await?;
        };

        let status = response.status();
        if !status.is_success() {
            return Err(scrape_error(format!("server returned status {status}")));
        }
        let body = self.read_body(response).await.map_err(|error| match error {
            Error::Request(cause) => scrape_error(cause.to_string()),
            other => other,
        })?;
        let html = String::from_utf8_lossy(&body);

        tracing::debug!(url, bytes = body.len(), "scraped page");
        Ok(format!("```{url}\n{}```\n", extract_text(&html)))
    }
}

/// Collects the visible text of `<body>` (or the whole document if there is
/// none), skipping script, style and noscript content.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        let Some(text_node) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().filter_map(ElementRef::wrap).any(|element| {
            SKIPPED_ELEMENTS.contains(&element.value().name())
        });
        let content = text_node.trim();
        if hidden || content.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(content);
    }
    text
}

/// Scrapes every URL in order and joins the pages with `---` separators.
///
/// # Errors
/// Returns an error if `urls` is empty or any page fails.
pub async fn scrape_all<S>(scraper: &S, urls: &[String]) -> Result<String>
where
    S: PageScraper + ?Sized,
{
    if urls.is_empty() {
        return Err(Error::InvalidRequest("URLs list cannot be empty".to_owned()));
    }
    let mut pages = Vec::with_capacity(urls.len());
    for url in urls {
        pages.push(scraper.scrape(url).await?);
    }
    Ok(pages.join(PAGE_SEPARATOR))
}
