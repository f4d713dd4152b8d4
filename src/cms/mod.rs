//! Ghost Content API access.
//!
//! - [`ContentApi`] - one request per call; [`GhostApi`] is the HTTP
//!   implementation
//! - [`CmsClient`] - retry with backoff on rate limiting, a short-term cache
//!   for normal hits and a long-term cache as the fallback of last resort
//! - [`RetryPolicy`] / [`retry::execute`] - the retry loop shared by every
//!   post and tag operation
//!
//! Errors are typed ([`CmsError`]) and classified into a closed
//! [`ErrorKind`] set; only [`ErrorKind::RateLimited`] is retried.

mod api;
mod client;
mod error;
pub mod retry;
mod types;

pub use api::{ContentApi, GhostApi, DEFAULT_API_VERSION};
pub use client::{
    CmsClient, CmsClientOptions, DEFAULT_LONG_TTL, DEFAULT_PAGE_SIZE, DEFAULT_SHORT_TTL,
    MAX_PAGE_SIZE,
};
pub use error::{CmsError, ErrorKind};
pub use retry::RetryPolicy;
pub use types::{BrowseOptions, PageLimit, Post, ReadKey, Tag, TagCount};
