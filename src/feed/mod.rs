//! External feed handling: RSS/Atom parsing and concurrent fetching.
//!
//! - [`parser`] - RSS 2.0, RSS 1.0 (RDF) and Atom XML into a [`Feed`]
//! - [`fetcher`] - HTTP retrieval with per-URL caching and all-settled
//!   fan-out across sources
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use blog_aggregator::cache::TtlCache;
//! use blog_aggregator::feed::{FeedFetcher, FeedSource};
//!
//! let fetcher = FeedFetcher::new(reqwest::Client::new(), Arc::new(TtlCache::new()));
//! let items = fetcher.fetch_many(&sources).await;
//! ```

mod dom;
mod fetcher;
mod parser;
mod types;

pub use fetcher::{
    FeedFetcher, FetchError, DEFAULT_FEED_TTL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
};
pub use parser::{parse_feed, ParseError};
pub use types::{Feed, FeedItem, FeedSource};
