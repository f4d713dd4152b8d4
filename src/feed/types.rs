use serde::{Deserialize, Serialize};

/// One external blog the aggregator pulls from.
///
/// `name` is the display name stamped on every item and the key used to join
/// items back to their source (for `color`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    #[serde(rename = "rssUrl", alias = "feed_url")]
    pub feed_url: String,
    /// Display hint: a utility class such as `bg-green-500` or a hex color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A parsed RSS/RDF/Atom document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub title: String,
    /// Canonical identity of the item.
    pub link: String,
    /// Publish timestamp in whatever format the feed used.
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub source: String,
}
