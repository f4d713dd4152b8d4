use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::StreamExt;
use thiserror::Error;

use super::parser::{parse_feed, ParseError};
use super::types::{Feed, FeedItem, FeedSource};
use crate::article::parse_timestamp;
use crate::cache::TtlCache;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// How long a successfully parsed feed is served from cache.
pub const DEFAULT_FEED_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; RSS Reader; blog-aggregator/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Errors that can occur while fetching a single feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Fetches external feeds over HTTP and caches successful parses by URL.
pub struct FeedFetcher {
    client: reqwest::Client,
    cache: Arc<TtlCache<Feed>>,
    cache_ttl: Duration,
    timeout: Duration,
    user_agent: String,
}

impl FeedFetcher {
    pub fn new(client: reqwest::Client, cache: Arc<TtlCache<Feed>>) -> Self {
        Self {
            client,
            cache,
            cache_ttl: DEFAULT_FEED_TTL,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Fetch and parse one feed, serving from cache when possible.
    ///
    /// Every failure (network, timeout, non-2xx, oversized body, unparsable
    /// XML) is logged and reported as `None`.
    pub async fn fetch_one(&self, source: &FeedSource) -> Option<Feed> {
        // Keyed by URL alone; items carry the name of whichever source
        // populated the entry, so re-stamp them for this one.
        if let Some(mut feed) = self.cache.get(&source.feed_url) {
            for item in &mut feed.items {
                if item.source != source.name {
                    item.source.clone_from(&source.name);
                }
            }
            return Some(feed);
        }

        match self.try_fetch(source).await {
            Ok(feed) => {
                tracing::debug!(
                    source = %source.name,
                    items = feed.items.len(),
                    "Fetched feed"
                );
                self.cache
                    .set(source.feed_url.clone(), feed.clone(), self.cache_ttl);
                Some(feed)
            }
            Err(e) => {
                tracing::error!(
                    source = %source.name,
                    feed = %source.feed_url,
                    error = %e,
                    "Feed fetch failed"
                );
                None
            }
        }
    }

    /// Fetch every source concurrently and return all items, newest first.
    ///
    /// One failing source never cancels or fails the others; its items are
    /// simply absent. Items whose date cannot be parsed sort last.
    pub async fn fetch_many(&self, sources: &[FeedSource]) -> Vec<FeedItem> {
        if sources.is_empty() {
            return Vec::new();
        }

        let results = join_all(sources.iter().map(|source| self.fetch_one(source))).await;

        let mut items = Vec::new();
        for (source, result) in sources.iter().zip(results) {
            match result {
                Some(feed) => items.extend(feed.items),
                None => tracing::warn!(source = %source.name, "Skipping feed that failed to load"),
            }
        }

        items.sort_by_cached_key(|item| {
            Reverse(parse_timestamp(&item.published_at).unwrap_or_default())
        });
        items
    }

    async fn try_fetch(&self, source: &FeedSource) -> Result<Feed, FetchError> {
        let request = self
            .client
            .get(&source.feed_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent);

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
        let xml = String::from_utf8_lossy(&bytes);
        Ok(parse_feed(&xml, &source.name)?)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
