use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use blog_aggregator::archive::{ArchiveService, MonthKey, DEFAULT_ARTICLES_PER_PAGE};
use blog_aggregator::cache::TtlCache;
use blog_aggregator::cms::{BrowseOptions, CmsClient, CmsClientOptions, GhostApi, ReadKey};
use blog_aggregator::feed::FeedFetcher;
use blog_aggregator::{ArticleAggregator, Config};

/// Get the config file path (~/.config/blog-aggregator/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("blog-aggregator")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "blog-aggregator",
    about = "Merge Ghost CMS posts with external RSS/Atom feeds"
)]
struct Args {
    /// Config file (default: ~/.config/blog-aggregator/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Newest articles from the CMS and external blogs
    Latest {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Leave out external blogs
        #[arg(long)]
        cms_only: bool,
        /// Fetch every article, ignoring --limit
        #[arg(long)]
        all: bool,
    },
    /// Featured CMS posts
    Featured {
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
    /// One zero-based page of the archive
    Archive {
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_ARTICLES_PER_PAGE)]
        per_page: usize,
    },
    /// Archive grouped by month, or one month given as YYYY-MM
    Months {
        #[arg(value_name = "YYYY-MM")]
        month: Option<String>,
    },
    /// CMS tags with post counts
    Tags,
    /// One CMS post by slug
    Post { slug: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; RUST_LOG controls verbosity
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?
        .with_env_overrides();
    tracing::debug!(config = ?config, "Effective configuration");

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let (ghost_url, ghost_key) = config
        .ghost_credentials()
        .context("Set GHOST_API_URL and GHOST_CONTENT_KEY or add them to the config file")?;
    let ghost_key = SecretString::from(ghost_key.expose_secret().to_owned());
    let api = GhostApi::new(http.clone(), ghost_url, ghost_key)
        .context("Invalid Ghost API URL")?
        .with_version(config.ghost_api_version.clone())
        .with_timeout(config.request_timeout());

    let cms = Arc::new(CmsClient::with_options(
        Arc::new(api),
        CmsClientOptions {
            retry: config.retry_policy(),
            short_ttl: config.cms_cache_ttl(),
            long_ttl: config.cms_fallback_ttl(),
            ..CmsClientOptions::default()
        },
    ));
    let feeds = FeedFetcher::new(http, Arc::new(TtlCache::new()))
        .with_cache_ttl(config.feed_cache_ttl())
        .with_timeout(config.request_timeout())
        .with_user_agent(config.user_agent.clone());

    let retries = config.max_retries;
    let aggregator = Arc::new(
        ArticleAggregator::new(cms.clone(), Arc::new(feeds), config.external_blogs.clone())
            .with_cms_retries(retries),
    );
    let archive = ArchiveService::new(aggregator.clone())
        .with_ttl(config.archive_cache_ttl())
        .with_zone(config.display_zone());

    match args.command {
        Command::Latest {
            limit,
            cms_only,
            all,
        } => print_json(&aggregator.get_latest_articles(limit, !cms_only, all).await),
        Command::Featured { limit } => print_json(&aggregator.get_featured_articles(limit).await),
        Command::Archive { page, per_page } => print_json(&archive.page(page, per_page).await),
        Command::Months { month: None } => print_json(&archive.months().await),
        Command::Months { month: Some(raw) } => {
            let month = MonthKey::parse(&raw).context("Invalid month")?;
            print_json(&archive.month(month).await)
        }
        Command::Tags => {
            let options = BrowseOptions::default().include("count.posts");
            let tags = cms
                .browse_tags(&options, retries)
                .await
                .context("Tags unavailable")?;
            print_json(&tags)
        }
        Command::Post { slug } => {
            let post = cms
                .read_post(&ReadKey::Slug(slug.clone()), retries)
                .await
                .with_context(|| format!("Post '{slug}' not found"))?;
            print_json(&post)
        }
    }
}
