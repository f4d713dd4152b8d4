//! Merges CMS posts and external feed items into one article list.
//!
//! Neither upstream can fail the aggregation: a CMS outage yields only
//! external articles, a feed outage only CMS articles, and both together an
//! empty list.

use std::sync::Arc;

use crate::article::{sort_newest_first, Article};
use crate::cms::{BrowseOptions, CmsClient};
use crate::feed::{FeedFetcher, FeedSource};

/// Default `max_retries` for aggregation calls into the CMS.
pub const DEFAULT_CMS_RETRIES: u32 = 3;

pub struct ArticleAggregator {
    cms: Arc<CmsClient>,
    feeds: Arc<FeedFetcher>,
    sources: Vec<FeedSource>,
    cms_retries: u32,
}

impl ArticleAggregator {
    pub fn new(cms: Arc<CmsClient>, feeds: Arc<FeedFetcher>, sources: Vec<FeedSource>) -> Self {
        Self {
            cms,
            feeds,
            sources,
            cms_retries: DEFAULT_CMS_RETRIES,
        }
    }

    pub fn with_cms_retries(mut self, retries: u32) -> Self {
        self.cms_retries = retries;
        self
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    /// Newest articles across the CMS and, optionally, every configured feed.
    ///
    /// With `unlimited` every CMS page is fetched and nothing is truncated;
    /// otherwise at most `limit` articles are returned.
    pub async fn get_latest_articles(
        &self,
        limit: usize,
        include_external: bool,
        unlimited: bool,
    ) -> Vec<Article> {
        if !unlimited && limit == 0 {
            return Vec::new();
        }

        let mut articles = self.cms_articles(limit, unlimited).await;

        if include_external && !self.sources.is_empty() {
            let items = self.feeds.fetch_many(&self.sources).await;
            tracing::debug!(count = items.len(), "Collected external feed items");
            articles.extend(
                items
                    .iter()
                    .map(|item| Article::from_feed_item(item, &self.sources)),
            );
        }

        sort_newest_first(&mut articles);
        if !unlimited {
            articles.truncate(limit);
        }
        articles
    }

    /// Featured CMS posts, newest first. External feeds are never included.
    pub async fn get_featured_articles(&self, limit: usize) -> Vec<Article> {
        let options = BrowseOptions::newest_first()
            .filter("featured:true")
            .limit(u32::try_from(limit).unwrap_or(u32::MAX));

        match self.cms.browse_posts(&options, self.cms_retries).await {
            Some(posts) => posts.iter().map(Article::from_post).collect(),
            None => {
                tracing::warn!("Featured posts unavailable, returning none");
                Vec::new()
            }
        }
    }

    async fn cms_articles(&self, limit: usize, unlimited: bool) -> Vec<Article> {
        let desired = (!unlimited).then_some(limit);
        let posts = self
            .cms
            .browse_all_posts(&BrowseOptions::newest_first(), desired, self.cms_retries)
            .await;

        match posts {
            Some(posts) => posts.iter().map(Article::from_post).collect(),
            None => {
                tracing::warn!("CMS posts unavailable (rate limit or error), showing external content only");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::cms::{CmsError, ContentApi, PageLimit, Post, ReadKey, Tag};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves a fixed post list, or fails every call.
    struct StaticApi {
        posts: Option<Vec<Post>>,
        filters: Mutex<Vec<Option<String>>>,
    }

    impl StaticApi {
        fn serving(posts: Vec<Post>) -> Self {
            Self {
                posts: Some(posts),
                filters: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                posts: None,
                filters: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContentApi for StaticApi {
        async fn browse_posts(&self, options: &BrowseOptions) -> Result<Vec<Post>, CmsError> {
            self.filters.lock().unwrap().push(options.filter.clone());
            let posts = self.posts.clone().ok_or(CmsError::HttpStatus(500))?;
            let posts: Vec<Post> = match options.filter.as_deref() {
                Some("featured:true") => posts.into_iter().filter(|p| p.featured).collect(),
                _ => posts,
            };
            let size = match options.limit {
                Some(PageLimit::Count(n)) => n as usize,
                _ => posts.len(),
            };
            let skip = (options.page.unwrap_or(1) as usize - 1) * size;
            Ok(posts.into_iter().skip(skip).take(size).collect())
        }

        async fn read_post(&self, _key: &ReadKey) -> Result<Post, CmsError> {
            Err(CmsError::NotFound)
        }

        async fn browse_tags(&self, _options: &BrowseOptions) -> Result<Vec<Tag>, CmsError> {
            Ok(Vec::new())
        }

        async fn read_tag(&self, _key: &ReadKey) -> Result<Tag, CmsError> {
            Err(CmsError::NotFound)
        }
    }

    fn post(slug: &str, published_at: &str, featured: bool) -> Post {
        Post {
            id: None,
            slug: slug.to_string(),
            title: slug.to_uppercase(),
            published_at: Some(published_at.to_string()),
            feature_image: None,
            excerpt: None,
            featured,
        }
    }

    fn aggregator(api: StaticApi) -> ArticleAggregator {
        let feeds = FeedFetcher::new(reqwest::Client::new(), Arc::new(TtlCache::new()));
        ArticleAggregator::new(Arc::new(CmsClient::new(Arc::new(api))), Arc::new(feeds), Vec::new())
            .with_cms_retries(1)
    }

    #[tokio::test]
    async fn test_zero_limit_returns_empty_without_calls() {
        let agg = aggregator(StaticApi::serving(vec![post("a", "2023-12-15T10:00:00Z", false)]));
        assert!(agg.get_latest_articles(0, true, false).await.is_empty());
    }

    #[tokio::test]
    async fn test_latest_sorted_and_truncated() {
        let agg = aggregator(StaticApi::serving(vec![
            post("new", "2023-12-01T00:00:00Z", false),
            post("mid", "2023-06-01T00:00:00Z", false),
            post("old", "2023-01-01T00:00:00Z", false),
        ]));

        let articles = agg.get_latest_articles(2, true, false).await;
        let slugs: Vec<_> = articles.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, ["new", "mid"]);
        assert!(articles.iter().all(|a| !a.is_external && a.is_consistent()));
    }

    #[tokio::test]
    async fn test_unlimited_ignores_limit() {
        let agg = aggregator(StaticApi::serving(vec![
            post("a", "2023-01-01T00:00:00Z", false),
            post("b", "2023-02-01T00:00:00Z", false),
            post("c", "2023-03-01T00:00:00Z", false),
        ]));

        assert_eq!(agg.get_latest_articles(0, false, true).await.len(), 3);
    }

    #[tokio::test]
    async fn test_cms_failure_yields_empty() {
        let agg = aggregator(StaticApi::failing());
        assert!(agg.get_latest_articles(10, true, false).await.is_empty());
    }

    #[tokio::test]
    async fn test_featured_uses_filter() {
        let api = Arc::new(StaticApi::serving(vec![
            post("plain", "2023-01-01T00:00:00Z", false),
            post("star", "2023-02-01T00:00:00Z", true),
        ]));
        let feeds = FeedFetcher::new(reqwest::Client::new(), Arc::new(TtlCache::new()));
        let agg = ArticleAggregator::new(
            Arc::new(CmsClient::new(api.clone())),
            Arc::new(feeds),
            Vec::new(),
        );

        let featured = agg.get_featured_articles(5).await;
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].slug, "star");
        assert_eq!(
            api.filters.lock().unwrap().as_slice(),
            [Some("featured:true".to_string())]
        );
    }

    #[tokio::test]
    async fn test_featured_failure_yields_empty() {
        let agg = aggregator(StaticApi::failing());
        assert!(agg.get_featured_articles(3).await.is_empty());
    }
}
