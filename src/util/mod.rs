//! Input validation helpers.
//!
//! - **Feed URLs**: scheme/host checks for configured feed sources
//! - **Slugs**: rejects placeholder and URL-like identifiers before they
//!   reach the CMS
//! - **Calendar parts**: year/month range checks for archive month keys

mod feed_url;
mod slug;

pub use feed_url::{validate_feed_url, FeedUrlError};
pub use slug::{is_month, is_slug, is_year, MAX_SLUG_LENGTH};
