use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::api::ContentApi;
use super::error::CmsError;
use super::retry::{self, RetryPolicy};
use super::types::{BrowseOptions, PageLimit, Post, ReadKey, Tag};
use crate::cache::{Clock, SystemClock, TieredCache};

/// Ghost's default page size when a request gives no `limit`.
pub const DEFAULT_PAGE_SIZE: u32 = 15;
/// Largest `limit` the Content API honors per page.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Safety valve for the page walk in [`CmsClient::browse_all_posts`].
const MAX_PAGES: u32 = 500;

pub const DEFAULT_SHORT_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_LONG_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Tunables for [`CmsClient`].
#[derive(Clone)]
pub struct CmsClientOptions {
    pub retry: RetryPolicy,
    /// Normal cache lifetime.
    pub short_ttl: Duration,
    /// Lifetime of the fallback copy served when upstream fails.
    pub long_ttl: Duration,
    pub clock: Arc<dyn Clock>,
}

impl Default for CmsClientOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            short_ttl: DEFAULT_SHORT_TTL,
            long_ttl: DEFAULT_LONG_TTL,
            clock: Arc::new(SystemClock),
        }
    }
}

/// Content API wrapper with retry, rate-limit backoff and two-tier caching.
///
/// Every operation returns `None` instead of an error: a failed call is
/// logged and answered from the long-term cache when it has a copy.
pub struct CmsClient {
    api: Arc<dyn ContentApi>,
    retry: RetryPolicy,
    post_lists: TieredCache<Vec<Post>>,
    posts: TieredCache<Post>,
    tag_lists: TieredCache<Vec<Tag>>,
    tags: TieredCache<Tag>,
}

impl CmsClient {
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self::with_options(api, CmsClientOptions::default())
    }

    pub fn with_options(api: Arc<dyn ContentApi>, options: CmsClientOptions) -> Self {
        Self {
            api,
            retry: options.retry,
            post_lists: tiered(&options),
            posts: tiered(&options),
            tag_lists: tiered(&options),
            tags: tiered(&options),
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// One page of posts.
    pub async fn browse_posts(&self, options: &BrowseOptions, max_retries: u32) -> Option<Vec<Post>> {
        let key = cache_key("posts.browse", options);
        self.cached_call(&self.post_lists, key, max_retries, || {
            self.api.browse_posts(options)
        })
        .await
    }

    /// A single post. Invalid keys return `None` without a request.
    pub async fn read_post(&self, key: &ReadKey, max_retries: u32) -> Option<Post> {
        if !key.is_valid() {
            tracing::warn!(key = ?key, "Rejecting invalid post identifier");
            return None;
        }
        let cache_key = cache_key("posts.read", key);
        self.cached_call(&self.posts, cache_key, max_retries, || self.api.read_post(key))
            .await
    }

    pub async fn browse_tags(&self, options: &BrowseOptions, max_retries: u32) -> Option<Vec<Tag>> {
        let key = cache_key("tags.browse", options);
        self.cached_call(&self.tag_lists, key, max_retries, || {
            self.api.browse_tags(options)
        })
        .await
    }

    /// A single tag. Invalid keys return `None` without a request.
    pub async fn read_tag(&self, key: &ReadKey, max_retries: u32) -> Option<Tag> {
        if !key.is_valid() {
            tracing::warn!(key = ?key, "Rejecting invalid tag identifier");
            return None;
        }
        let cache_key = cache_key("tags.read", key);
        self.cached_call(&self.tags, cache_key, max_retries, || self.api.read_tag(key))
            .await
    }

    /// Walk pages sequentially until `desired` posts are collected or the
    /// listing runs out.
    ///
    /// Stops on an empty page or a page shorter than the page size. `desired`
    /// of `None` collects everything. A failed page ends the walk with what
    /// was gathered so far; only a failed first page yields `None`.
    pub async fn browse_all_posts(
        &self,
        options: &BrowseOptions,
        desired: Option<usize>,
        max_retries: u32,
    ) -> Option<Vec<Post>> {
        let page_size = match (options.limit, desired) {
            (Some(PageLimit::Count(n)), _) => n,
            (_, Some(d)) => u32::try_from(d).unwrap_or(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        }
        .clamp(1, MAX_PAGE_SIZE);

        let first_page = options.page.unwrap_or(1);
        let mut collected: Vec<Post> = Vec::new();

        for page in first_page..first_page.saturating_add(MAX_PAGES) {
            let page_options = BrowseOptions {
                limit: Some(PageLimit::Count(page_size)),
                page: Some(page),
                ..options.clone()
            };

            let Some(batch) = self.browse_posts(&page_options, max_retries).await else {
                if page == first_page {
                    return None;
                }
                tracing::warn!(
                    page = page,
                    collected = collected.len(),
                    "CMS page failed, returning partial listing"
                );
                break;
            };

            let batch_len = batch.len();
            collected.extend(batch);

            if let Some(desired) = desired {
                if collected.len() >= desired {
                    collected.truncate(desired);
                    break;
                }
            }
            if batch_len < page_size as usize {
                break;
            }
        }

        Some(collected)
    }

    async fn cached_call<T, F, Fut>(
        &self,
        cache: &TieredCache<T>,
        key: String,
        max_retries: u32,
        call: F,
    ) -> Option<T>
    where
        T: Clone,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CmsError>>,
    {
        if let Some(hit) = cache.fresh(&key) {
            return Some(hit);
        }

        let policy = self.retry.with_max_attempts(max_retries);
        match retry::execute(&policy, &key, call).await {
            Ok(value) => {
                cache.store(&key, value.clone());
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, kind = ?e.kind(), error = %e, "CMS request failed");
                cache.fallback(&key)
            }
        }
    }
}

fn tiered<T: Clone>(options: &CmsClientOptions) -> TieredCache<T> {
    TieredCache::with_clock(options.short_ttl, options.long_ttl, Arc::clone(&options.clock))
}

fn cache_key<T: serde::Serialize>(method: &str, options: &T) -> String {
    let options = serde_json::to_string(options).unwrap_or_default();
    format!("{method}-{options}")
}
