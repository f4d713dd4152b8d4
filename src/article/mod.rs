//! The normalized article entity shared by the aggregator and archive views.
//!
//! Articles are never built field-by-field outside this module: CMS posts go
//! through [`Article::from_post`] and feed items through
//! [`Article::from_feed_item`], which keeps `is_external` in lockstep with
//! `source` and `external_url`.

mod date;

pub use date::{
    default_display_zone, parse_timestamp, parse_utc_offset, DateValue, DEFAULT_DISPLAY_OFFSET_SECS,
};

use serde::{Deserialize, Serialize};

use crate::cms::Post;
use crate::feed::{FeedItem, FeedSource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// CMS slug, or the item link for external articles.
    pub slug: String,
    pub published_at: DateValue,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Display name of the external blog; `None` for CMS posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub is_external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_color: Option<String>,
}

impl Article {
    pub fn from_post(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            published_at: DateValue::from(post.published_at.clone().unwrap_or_default()),
            title: post.title.clone(),
            feature_image: post.feature_image.clone(),
            excerpt: post.excerpt.clone(),
            source: None,
            is_external: false,
            external_url: None,
            source_color: None,
        }
    }

    /// Convert a feed item, taking display name and color from the
    /// configured source whose name matches the item's `source`.
    pub fn from_feed_item(item: &FeedItem, sources: &[FeedSource]) -> Self {
        let configured = sources.iter().find(|s| s.name == item.source);
        let source = configured
            .map(|s| s.name.clone())
            .unwrap_or_else(|| item.source.clone());

        Self {
            slug: item.link.clone(),
            published_at: DateValue::from(item.published_at.clone()),
            title: item.title.clone(),
            feature_image: None,
            excerpt: item.description.clone(),
            source: Some(source),
            is_external: true,
            external_url: Some(item.link.clone()),
            source_color: configured.and_then(|s| s.color.clone()),
        }
    }

    /// Whether `is_external` agrees with the presence of `source` and
    /// `external_url`.
    pub fn is_consistent(&self) -> bool {
        self.is_external == (self.source.is_some() && self.external_url.is_some())
    }
}

/// Sort newest first by resolved publish instant.
///
/// The sort is stable; unparsable dates sort last (as the epoch).
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by_cached_key(|a| std::cmp::Reverse(a.published_at.instant_or_epoch()));
}
