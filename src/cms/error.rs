use serde::Deserialize;
use thiserror::Error;

/// Ghost's error `type` for rate limiting.
const RATE_LIMIT_ERROR_TYPE: &str = "TooManyRequestsError";
const NOT_FOUND_ERROR_TYPE: &str = "NotFoundError";

/// Errors from a single Content API call.
#[derive(Debug, Error)]
pub enum CmsError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    /// Non-2xx status without a recognizable Ghost error body.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Non-2xx status with a Ghost `{"errors": [...]}` body.
    #[error("Ghost API error {error_type} (status {status}): {message}")]
    Api {
        status: u16,
        error_type: String,
        message: String,
    },
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// A read returned an empty result set.
    #[error("Resource not found")]
    NotFound,
}

/// Closed classification of [`CmsError`] used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    NotFound,
    Network,
    Malformed,
    Unknown,
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

impl CmsError {
    /// Build the error for a non-2xx response, using Ghost's error body when
    /// it has one.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => match parsed.errors.into_iter().next() {
                Some(detail) => CmsError::Api {
                    status,
                    error_type: detail.error_type,
                    message: detail.message,
                },
                None => CmsError::HttpStatus(status),
            },
            Err(_) => CmsError::HttpStatus(status),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CmsError::HttpStatus(429) => ErrorKind::RateLimited,
            CmsError::Api { status: 429, .. } => ErrorKind::RateLimited,
            CmsError::Api { error_type, .. } if error_type == RATE_LIMIT_ERROR_TYPE => {
                ErrorKind::RateLimited
            }
            CmsError::HttpStatus(404) | CmsError::Api { status: 404, .. } | CmsError::NotFound => {
                ErrorKind::NotFound
            }
            CmsError::Api { error_type, .. } if error_type == NOT_FOUND_ERROR_TYPE => {
                ErrorKind::NotFound
            }
            CmsError::Network(_) | CmsError::Timeout => ErrorKind::Network,
            CmsError::Decode(_) | CmsError::InvalidUrl(_) => ErrorKind::Malformed,
            CmsError::HttpStatus(_) | CmsError::Api { .. } => ErrorKind::Unknown,
        }
    }
}
