//! Blog article aggregation: Ghost CMS posts merged with external RSS/Atom
//! feeds into one date-sorted, cached article list with archive views.

pub mod aggregator;
pub mod archive;
pub mod article;
pub mod cache;
pub mod cms;
pub mod config;
pub mod feed;
pub mod util;

pub use aggregator::ArticleAggregator;
pub use archive::{ArchivePage, ArchiveService, MonthGroup, MonthKey};
pub use article::{Article, DateValue};
pub use config::Config;
