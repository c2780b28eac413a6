//! Crawler module: the concurrent crawl engine
//!
//! This module contains:
//! - The frontier every worker pops from
//! - Quiescence detection and the shutdown signal
//! - The worker loop and the coordinator that owns the pool
//! - The fetcher and extractor seams, with web implementations
//!
//! A crawl with the default web collaborators:
//!
//! ```no_run
//! use tidepool::config::load_config;
//! use tidepool::crawler::crawl;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(Path::new("tidepool.toml"))?;
//! let results = crawl(&config).await?;
//! println!("Crawled pages: {}", results.len());
//! # Ok(())
//! # }
//! ```

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod termination;
mod worker;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, Fetcher, HttpFetcher, StaticFetcher};
pub use frontier::Frontier;
pub use parser::{Extractor, HtmlLinkExtractor};
pub use termination::TerminationMode;
pub use worker::WorkerSummary;

use crate::config::Config;
use crate::state::ResultStore;
use crate::CrawlError;

/// Builds the web coordinator described by a configuration and seeds it
///
/// Seeds are normalized URLs. Nothing is fetched until `run` is called.
pub fn web_coordinator(
    config: &Config,
) -> Result<Coordinator<HttpFetcher, HtmlLinkExtractor>, CrawlError> {
    let fetcher = HttpFetcher::new(&config.fetch)?;
    let extractor = HtmlLinkExtractor::new().same_domain_only(config.extract.same_domain_only);

    let coordinator =
        Coordinator::new(fetcher, extractor).with_termination(config.crawler.termination);

    let seeds = config
        .seeds
        .urls
        .iter()
        .map(|raw| crate::location::Location::parse_url(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let admitted = coordinator.seed_locations(seeds);
    tracing::info!("Seeded {} locations", admitted);

    Ok(coordinator)
}

/// Runs a complete web crawl
///
/// This will:
/// 1. Build the HTTP fetcher and HTML link extractor
/// 2. Seed the frontier from the configured URLs
/// 3. Run the worker pool to quiescence
///
/// # Returns
///
/// * `Ok(ResultStore)` - Every page fetched successfully
/// * `Err(CrawlError)` - Setup failed or a worker panicked
pub async fn crawl(config: &Config) -> Result<ResultStore, CrawlError> {
    let coordinator = web_coordinator(config)?;
    coordinator
        .run(config.crawler.workers, config.crawler.idle_timeout())
        .await
}
