use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::util::is_slug;

/// A post as returned by the Ghost Content API.
///
/// Only the fields the aggregator reads are modeled; everything else in the
/// response is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub feature_image: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub feature_image: Option<String>,
    #[serde(default)]
    pub count: Option<TagCount>,
}

/// Present when the request used `include=count.posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub posts: u64,
}

/// Page size: a number, or every item in one response (`"all"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    Count(u32),
    All,
}

impl Serialize for PageLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageLimit::Count(n) => serializer.serialize_u32(*n),
            PageLimit::All => serializer.serialize_str("all"),
        }
    }
}

impl<'de> Deserialize<'de> for PageLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(PageLimit::Count(n)),
            Raw::Text(text) if text == "all" => Ok(PageLimit::All),
            Raw::Text(text) => Err(serde::de::Error::custom(format!(
                "expected a number or \"all\", got {text:?}"
            ))),
        }
    }
}

impl PageLimit {
    fn as_query(&self) -> String {
        match self {
            PageLimit::Count(n) => n.to_string(),
            PageLimit::All => "all".to_string(),
        }
    }
}

/// Query options for the `browse` endpoints.
///
/// Serialized form doubles as the cache key, so field order is fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<PageLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl BrowseOptions {
    /// Posts ordered by `published_at DESC`.
    pub fn newest_first() -> Self {
        Self {
            order: Some("published_at DESC".to_string()),
            ..Self::default()
        }
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(PageLimit::Count(limit));
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn include(mut self, include: impl Into<String>) -> Self {
        self.include = Some(include.into());
        self
    }

    /// Query-string pairs in Ghost's parameter names.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(filter) = &self.filter {
            pairs.push(("filter", filter.clone()));
        }
        if let Some(order) = &self.order {
            pairs.push(("order", order.clone()));
        }
        if let Some(limit) = &self.limit {
            pairs.push(("limit", limit.as_query()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(include) = &self.include {
            pairs.push(("include", include.clone()));
        }
        if let Some(fields) = &self.fields {
            pairs.push(("fields", fields.clone()));
        }
        pairs
    }
}

/// Identifies a single post or tag for the `read` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadKey {
    Slug(String),
    Id(String),
}

impl ReadKey {
    /// Reject placeholder, URL-like and malformed identifiers before any
    /// request is made.
    pub fn is_valid(&self) -> bool {
        match self {
            ReadKey::Slug(slug) => is_slug(slug),
            ReadKey::Id(id) => {
                let id = id.trim();
                !id.is_empty()
                    && !matches!(id, "undefined" | "null")
                    && id.chars().all(|c| c.is_ascii_alphanumeric())
            }
        }
    }
}

/// `{"posts": [...]}` envelope shared by browse and read responses.
#[derive(Debug, Deserialize)]
pub(crate) struct PostsEnvelope {
    pub posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagsEnvelope {
    pub tags: Vec<Tag>,
}
