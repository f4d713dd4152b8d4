use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;

use super::{articles_in_month, group_by_month, paginate, ArchivePage, MonthGroup, MonthKey};
use crate::aggregator::ArticleAggregator;
use crate::article::{default_display_zone, Article};
use crate::cache::{Clock, SystemClock, TtlCache};

pub const ARCHIVE_CACHE_KEY: &str = "archive:all-articles";
pub const DEFAULT_ARCHIVE_TTL: Duration = Duration::from_secs(60 * 60);

/// Archive views backed by one cached copy of every article.
///
/// The full merged list (all CMS pages plus every feed) is expensive, so it
/// is built once per TTL and every page or month view is cut from it. An
/// empty aggregate is not cached, so an outage is retried on the next call.
pub struct ArchiveService {
    aggregator: Arc<ArticleAggregator>,
    cache: TtlCache<Vec<Article>>,
    ttl: Duration,
    zone: FixedOffset,
}

impl ArchiveService {
    pub fn new(aggregator: Arc<ArticleAggregator>) -> Self {
        Self::with_clock(aggregator, Arc::new(SystemClock))
    }

    pub fn with_clock(aggregator: Arc<ArticleAggregator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            aggregator,
            cache: TtlCache::with_clock(clock),
            ttl: DEFAULT_ARCHIVE_TTL,
            zone: default_display_zone(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Zone month views are computed in.
    pub fn with_zone(mut self, zone: FixedOffset) -> Self {
        self.zone = zone;
        self
    }

    /// Every article, newest first.
    pub async fn all_articles(&self) -> Vec<Article> {
        if let Some(cached) = self.cache.get(ARCHIVE_CACHE_KEY) {
            return cached;
        }

        let articles = self.aggregator.get_latest_articles(0, true, true).await;
        tracing::info!(count = articles.len(), "Built archive article list");
        if !articles.is_empty() {
            self.cache.set(ARCHIVE_CACHE_KEY, articles.clone(), self.ttl);
        }
        articles
    }

    pub async fn page(&self, page: usize, per_page: usize) -> ArchivePage {
        paginate(&self.all_articles().await, page, per_page)
    }

    pub async fn months(&self) -> Vec<MonthGroup> {
        group_by_month(&self.all_articles().await, self.zone)
    }

    pub async fn month(&self, month: MonthKey) -> Vec<Article> {
        articles_in_month(&self.all_articles().await, month, self.zone)
    }

    /// Drop the cached list so the next view rebuilds it.
    pub fn invalidate(&self) {
        self.cache.delete(ARCHIVE_CACHE_KEY);
    }
}
