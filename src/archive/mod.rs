//! Archive views over a newest-first article list.
//!
//! Two views: month groups keyed `YYYY-MM` (newest month first) and
//! fixed-size pages with a `hasMore` flag for "load more" clients.
//! [`ArchiveService`] caches the full merged list both views are cut from.

mod service;

pub use service::{ArchiveService, ARCHIVE_CACHE_KEY, DEFAULT_ARCHIVE_TTL};

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::article::{Article, DateValue};
use crate::util::{is_month, is_year};

/// Page size used when the caller gives none.
pub const DEFAULT_ARTICLES_PER_PAGE: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonthKeyError {
    #[error("month key must look like YYYY-MM: {0:?}")]
    Format(String),
    #[error("year out of range: {0}")]
    Year(i32),
    #[error("month out of range: {0}")]
    Month(u32),
}

/// A calendar month; orders chronologically and displays as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn parse(raw: &str) -> Result<Self, MonthKeyError> {
        let format_err = || MonthKeyError::Format(raw.to_string());

        let (year, month) = raw.trim().split_once('-').ok_or_else(format_err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(format_err());
        }
        let year: i32 = year.parse().map_err(|_| format_err())?;
        let month: u32 = month.parse().map_err(|_| format_err())?;

        if !is_year(year) {
            return Err(MonthKeyError::Year(year));
        }
        if !is_month(month) {
            return Err(MonthKeyError::Month(month));
        }
        Ok(Self { year, month })
    }

    /// Month the article was published in, as seen from `zone`.
    ///
    /// Unparsable dates land in the month of the Unix epoch.
    pub fn of(article: &Article, zone: FixedOffset) -> Self {
        match article.published_at.to_ymd(zone) {
            Some(DateValue::Ymd { year, month, .. }) => Self { year, month },
            _ => {
                let epoch = article.published_at.instant_or_epoch().with_timezone(&zone);
                Self {
                    year: epoch.year(),
                    month: epoch.month(),
                }
            }
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthGroup {
    /// `YYYY-MM`.
    pub key: String,
    pub articles: Vec<Article>,
}

/// One window of the flat archive list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivePage {
    pub posts: Vec<Article>,
    pub has_more: bool,
    pub total_articles: usize,
    pub current_page: usize,
}

/// Group articles by publish month in `zone`, newest month first.
///
/// Articles keep their input order inside each group.
pub fn group_by_month(articles: &[Article], zone: FixedOffset) -> Vec<MonthGroup> {
    let mut groups: Vec<(MonthKey, Vec<Article>)> = Vec::new();

    for article in articles {
        let key = MonthKey::of(article, zone);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, bucket)) => bucket.push(article.clone()),
            None => groups.push((key, vec![article.clone()])),
        }
    }

    groups.sort_by(|(a, _), (b, _)| b.cmp(a));
    groups
        .into_iter()
        .map(|(key, articles)| MonthGroup {
            key: key.to_string(),
            articles,
        })
        .collect()
}

/// Articles published in `month` (in `zone`), input order preserved.
pub fn articles_in_month(articles: &[Article], month: MonthKey, zone: FixedOffset) -> Vec<Article> {
    articles
        .iter()
        .filter(|a| MonthKey::of(a, zone) == month)
        .cloned()
        .collect()
}

/// Zero-based page `page` of `per_page` articles.
///
/// A page past the end is empty with `has_more == false`. A `per_page` of 0
/// is treated as 1.
pub fn paginate(articles: &[Article], page: usize, per_page: usize) -> ArchivePage {
    let per_page = per_page.max(1);
    let total = articles.len();
    let start = page.saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);

    ArchivePage {
        posts: articles[start..end].to_vec(),
        has_more: end < total,
        total_articles: total,
        current_page: page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::default_display_zone;
    use crate::cms::Post;
    use chrono::{Offset, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn article(slug: &str, published_at: &str) -> Article {
        Article::from_post(&Post {
            id: None,
            slug: slug.to_string(),
            title: slug.to_string(),
            published_at: Some(published_at.to_string()),
            feature_image: None,
            excerpt: None,
            featured: false,
        })
    }

    fn numbered(count: usize) -> Vec<Article> {
        (0..count)
            .map(|i| article(&format!("post-{i}"), "2023-12-01T00:00:00Z"))
            .collect()
    }

    #[test]
    fn test_month_key_parse() {
        assert_eq!(MonthKey::parse("2023-07"), Ok(MonthKey { year: 2023, month: 7 }));
        assert_eq!("1999-12".parse::<MonthKey>().unwrap().to_string(), "1999-12");
        assert_eq!(MonthKey::parse("2023-13"), Err(MonthKeyError::Month(13)));
        assert_eq!(MonthKey::parse("0999-01"), Err(MonthKeyError::Year(999)));
        assert!(matches!(MonthKey::parse("2023-7"), Err(MonthKeyError::Format(_))));
        assert!(matches!(MonthKey::parse("july"), Err(MonthKeyError::Format(_))));
    }

    #[test]
    fn test_group_by_month_descending_keys() {
        let articles = vec![
            article("dec-b", "2023-12-20T00:00:00Z"),
            article("nov", "2023-11-02T00:00:00Z"),
            article("dec-a", "2023-12-01T00:00:00Z"),
            article("jan", "2024-01-05T00:00:00Z"),
        ];

        let groups = group_by_month(&articles, Utc.fix());
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, ["2024-01", "2023-12", "2023-11"]);

        let december: Vec<_> = groups[1].articles.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(december, ["dec-b", "dec-a"]);
    }

    #[test]
    fn test_group_by_month_accepts_ymd_dates() {
        let mut a = article("ymd", "2023-01-01T00:00:00Z");
        a.published_at = DateValue::Ymd {
            year: 2022,
            month: 3,
            day: 9,
        };
        let groups = group_by_month(&[a], default_display_zone());
        assert_eq!(groups[0].key, "2022-03");
    }

    #[test]
    fn test_month_boundary_follows_display_zone() {
        // 08:00 JST on the 1st is still November 30th in UTC.
        let articles = vec![article("early", "2023-12-01T08:00:00.000+09:00")];

        let jst = group_by_month(&articles, default_display_zone());
        assert_eq!(jst[0].key, "2023-12");

        let utc = group_by_month(&articles, Utc.fix());
        assert_eq!(utc[0].key, "2023-11");

        let december = MonthKey { year: 2023, month: 12 };
        assert_eq!(articles_in_month(&articles, december, default_display_zone()).len(), 1);
        assert!(articles_in_month(&articles, december, Utc.fix()).is_empty());
    }

    #[test]
    fn test_unparsable_date_groups_under_epoch_month() {
        let articles = vec![article("broken", "not a date")];
        let groups = group_by_month(&articles, Utc.fix());
        assert_eq!(groups[0].key, "1970-01");
    }

    #[test]
    fn test_articles_in_month() {
        let articles = vec![
            article("a", "2023-12-20T00:00:00Z"),
            article("b", "2023-11-02T00:00:00Z"),
        ];
        let found = articles_in_month(&articles, MonthKey { year: 2023, month: 11 }, Utc.fix());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "b");
    }

    #[test]
    fn test_paginate_sixteen_by_twelve() {
        let articles = numbered(16);

        let first = paginate(&articles, 0, 12);
        assert_eq!(first.posts.len(), 12);
        assert!(first.has_more);
        assert_eq!(first.total_articles, 16);
        assert_eq!(first.current_page, 0);

        let second = paginate(&articles, 1, 12);
        assert_eq!(second.posts.len(), 4);
        assert!(!second.has_more);
        assert_eq!(second.posts[0].slug, "post-12");
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let page = paginate(&numbered(3), 5, 12);
        assert!(page.posts.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.total_articles, 3);
    }

    #[test]
    fn test_archive_page_json_shape() {
        let json = serde_json::to_value(paginate(&numbered(1), 0, 12)).unwrap();
        assert_eq!(json["hasMore"], false);
        assert_eq!(json["totalArticles"], 1);
        assert_eq!(json["currentPage"], 0);
        assert_eq!(json["posts"][0]["slug"], "post-0");
    }

    proptest! {
        #[test]
        fn pages_partition_the_list(total in 0usize..80, per_page in 1usize..20) {
            let articles = numbered(total);
            let mut seen = Vec::new();
            let mut page = 0;
            loop {
                let window = paginate(&articles, page, per_page);
                seen.extend(window.posts.iter().map(|a| a.slug.clone()));
                if !window.has_more {
                    break;
                }
                page += 1;
            }
            let expected: Vec<_> = articles.iter().map(|a| a.slug.clone()).collect();
            prop_assert_eq!(seen, expected);
        }
    }
}
