use thiserror::Error;
use url::Url;

/// Reasons a configured feed URL is unusable.
#[derive(Error, Debug)]
pub enum FeedUrlError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

/// Validates a configured feed URL.
///
/// Only `http` and `https` URLs with a host are accepted. Private and
/// loopback addresses are allowed: feed sources come from the operator's own
/// configuration, not from end users.
///
/// # Examples
///
/// ```
/// use blog_aggregator::util::validate_feed_url;
///
/// assert!(validate_feed_url("https://zenn.dev/user/feed").is_ok());
/// assert!(validate_feed_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_feed_url(url_str: &str) -> Result<Url, FeedUrlError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(FeedUrlError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(FeedUrlError::MissingHost);
    }

    Ok(url)
}
