//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use blog_aggregator::cache::TtlCache;
use blog_aggregator::cms::{BrowseOptions, CmsClient, CmsError, ContentApi, PageLimit, Post, ReadKey, Tag};
use blog_aggregator::feed::{FeedFetcher, FeedSource};
use blog_aggregator::ArticleAggregator;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory CMS that pages through `posts`, or fails every call with an
/// HTTP status.
pub struct FakeCms {
    posts: Vec<Post>,
    failure: Option<u16>,
    calls: AtomicU32,
}

impl FakeCms {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts,
            failure: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Every call fails with a non-retryable 503.
    pub fn failing() -> Self {
        Self::failing_with(503)
    }

    /// Every call is answered with 429, so each one exhausts its retries.
    pub fn rate_limited() -> Self {
        Self::failing_with(429)
    }

    fn failing_with(status: u16) -> Self {
        Self {
            posts: Vec::new(),
            failure: Some(status),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentApi for FakeCms {
    async fn browse_posts(&self, options: &BrowseOptions) -> Result<Vec<Post>, CmsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.failure {
            return Err(CmsError::HttpStatus(status));
        }
        let size = match options.limit {
            Some(PageLimit::Count(n)) => n as usize,
            _ => 15,
        };
        let skip = (options.page.unwrap_or(1) as usize - 1) * size;
        Ok(self.posts.iter().skip(skip).take(size).cloned().collect())
    }

    async fn read_post(&self, key: &ReadKey) -> Result<Post, CmsError> {
        match key {
            ReadKey::Slug(slug) => self
                .posts
                .iter()
                .find(|p| &p.slug == slug)
                .cloned()
                .ok_or(CmsError::NotFound),
            ReadKey::Id(_) => Err(CmsError::NotFound),
        }
    }

    async fn browse_tags(&self, _options: &BrowseOptions) -> Result<Vec<Tag>, CmsError> {
        Ok(Vec::new())
    }

    async fn read_tag(&self, _key: &ReadKey) -> Result<Tag, CmsError> {
        Err(CmsError::NotFound)
    }
}

pub fn post(slug: &str, published_at: &str) -> Post {
    Post {
        id: None,
        slug: slug.to_string(),
        title: format!("CMS {slug}"),
        published_at: Some(published_at.to_string()),
        feature_image: Some(format!("https://cdn.example.com/{slug}.png")),
        excerpt: Some("From the CMS".to_string()),
        featured: false,
    }
}

/// RSS 2.0 document with one item per `(title, link, pubDate)`.
pub fn rss(items: &[(&str, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link, date)| {
            format!(
                "<item><title>{title}</title><link>{link}</link><pubDate>{date}</pubDate>\
                 <description>About {title}</description></item>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Remote</title><link>https://remote.example.com</link>{items}</channel></rss>"#
    )
}

pub async fn mount_feed(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("Content-Type", "application/rss+xml"),
        )
        .mount(server)
        .await;
}

pub async fn mount_failure(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

pub fn source(name: &str, url: String, color: Option<&str>) -> FeedSource {
    FeedSource {
        name: name.to_string(),
        feed_url: url,
        color: color.map(str::to_string),
    }
}

pub fn fetcher() -> Arc<FeedFetcher> {
    Arc::new(FeedFetcher::new(reqwest::Client::new(), Arc::new(TtlCache::new())))
}

pub fn aggregator(cms: Arc<FakeCms>, sources: Vec<FeedSource>) -> ArticleAggregator {
    ArticleAggregator::new(Arc::new(CmsClient::new(cms)), fetcher(), sources).with_cms_retries(1)
}
