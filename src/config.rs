//! Configuration file parser for ~/.config/blog-aggregator/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos. Environment variables (`GHOST_API_URL`,
//! `GHOST_CONTENT_KEY`, `EXTERNAL_BLOGS`) override the file.
use std::path::Path;
use std::time::Duration;

use chrono::FixedOffset;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::article::{default_display_zone, parse_utc_offset};
use crate::cms::RetryPolicy;
use crate::feed::FeedSource;
use crate::util::validate_feed_url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid display_utc_offset {0:?}: expected e.g. \"+09:00\"")]
    InvalidOffset(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// The Debug impl masks `ghost_content_key`.
#[derive(Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Ghost site, e.g. `https://blog.example.com`.
    pub ghost_api_url: Option<String>,

    #[serde(deserialize_with = "deserialize_secret")]
    pub ghost_content_key: Option<SecretString>,

    /// Value of the `Accept-Version` header.
    pub ghost_api_version: String,

    /// External blogs merged into the listing.
    pub external_blogs: Vec<FeedSource>,

    pub feed_cache_ttl_secs: u64,
    pub cms_cache_ttl_secs: u64,
    /// Lifetime of the fallback copy served while the CMS is failing.
    pub cms_fallback_ttl_secs: u64,
    pub archive_cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,

    /// Total CMS attempts per call, including the first.
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,

    /// UTC offset archive months are computed in, e.g. `+09:00`.
    pub display_utc_offset: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ghost_api_url: None,
            ghost_content_key: None,
            ghost_api_version: crate::cms::DEFAULT_API_VERSION.to_string(),
            external_blogs: Vec::new(),
            feed_cache_ttl_secs: 3600,
            cms_cache_ttl_secs: 3600,
            cms_fallback_ttl_secs: 7 * 24 * 3600,
            archive_cache_ttl_secs: 3600,
            request_timeout_secs: 30,
            user_agent: crate::feed::DEFAULT_USER_AGENT.to_string(),
            max_retries: 3,
            retry_base_delay_ms: 30_000,
            display_utc_offset: "+09:00".to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("ghost_api_url", &self.ghost_api_url)
            .field(
                "ghost_content_key",
                &self.ghost_content_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("ghost_api_version", &self.ghost_api_version)
            .field("external_blogs", &self.external_blogs)
            .field("feed_cache_ttl_secs", &self.feed_cache_ttl_secs)
            .field("cms_cache_ttl_secs", &self.cms_cache_ttl_secs)
            .field("cms_fallback_ttl_secs", &self.cms_fallback_ttl_secs)
            .field("archive_cache_ttl_secs", &self.archive_cache_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("display_utc_offset", &self.display_utc_offset)
            .finish()
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(SecretString::from))
}

const KNOWN_KEYS: [&str; 13] = [
    "ghost_api_url",
    "ghost_content_key",
    "ghost_api_version",
    "external_blogs",
    "feed_cache_ttl_secs",
    "cms_cache_ttl_secs",
    "cms_fallback_ttl_secs",
    "archive_cache_ttl_secs",
    "request_timeout_secs",
    "user_agent",
    "max_retries",
    "retry_base_delay_ms",
    "display_utc_offset",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - External blogs with an unusable feed URL → dropped, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a corrupted file cannot exhaust memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            external_blogs = config.external_blogs.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse TOML text; blank text yields the defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(content)?;
        if parse_utc_offset(&config.display_utc_offset).is_none() {
            return Err(ConfigError::InvalidOffset(config.display_utc_offset));
        }
        config.external_blogs = retain_valid_sources(config.external_blogs);
        Ok(config)
    }

    /// Apply `GHOST_API_URL`, `GHOST_CONTENT_KEY` and `EXTERNAL_BLOGS` from
    /// the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("GHOST_API_URL") {
            self.ghost_api_url = Some(url);
        }
        if let Some(key) = lookup("GHOST_CONTENT_KEY") {
            self.ghost_content_key = Some(SecretString::from(key));
        }
        if let Some(blogs) = lookup("EXTERNAL_BLOGS") {
            self.external_blogs = parse_external_blogs(&blogs);
        }
        self
    }

    /// Ghost base URL and content key, both required to talk to the CMS.
    pub fn ghost_credentials(&self) -> Result<(&str, &SecretString), ConfigError> {
        let url = self
            .ghost_api_url
            .as_deref()
            .ok_or(ConfigError::Missing("ghost_api_url"))?;
        let key = self
            .ghost_content_key
            .as_ref()
            .ok_or(ConfigError::Missing("ghost_content_key"))?;
        Ok((url, key))
    }

    pub fn feed_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.feed_cache_ttl_secs)
    }

    pub fn cms_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cms_cache_ttl_secs)
    }

    pub fn cms_fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.cms_fallback_ttl_secs)
    }

    pub fn archive_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.archive_cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Zone for archive month views; validated when the file is parsed.
    pub fn display_zone(&self) -> FixedOffset {
        parse_utc_offset(&self.display_utc_offset).unwrap_or_else(default_display_zone)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            ..RetryPolicy::default()
        }
    }
}

// ============================================================================
// External blog list
// ============================================================================

/// Parse the `EXTERNAL_BLOGS` JSON array of `{name, rssUrl, color?}`.
///
/// Entries without a string `name` and `rssUrl`, or whose URL is not a
/// usable http(s) feed URL, are dropped with a warning. Invalid JSON or a
/// non-array value yields an empty list.
pub fn parse_external_blogs(raw: &str) -> Vec<FeedSource> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "EXTERNAL_BLOGS is not valid JSON, ignoring");
            return Vec::new();
        }
    };

    let Some(entries) = value.as_array() else {
        tracing::warn!("EXTERNAL_BLOGS is not a JSON array, ignoring");
        return Vec::new();
    };

    let sources = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let name = entry.get("name").and_then(|v| v.as_str());
            let url = entry.get("rssUrl").and_then(|v| v.as_str());
            match (name, url) {
                (Some(name), Some(url)) => Some(FeedSource {
                    name: name.to_string(),
                    feed_url: url.to_string(),
                    color: entry
                        .get("color")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                }),
                _ => {
                    tracing::warn!(index = index, "External blog entry needs string name and rssUrl, skipping");
                    None
                }
            }
        })
        .collect();

    retain_valid_sources(sources)
}

fn retain_valid_sources(sources: Vec<FeedSource>) -> Vec<FeedSource> {
    sources
        .into_iter()
        .filter(|source| match validate_feed_url(&source.feed_url) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(name = %source.name, error = %e, "Skipping external blog with invalid feed URL");
                false
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
