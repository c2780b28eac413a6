//! Crawl summary data

use crate::crawler::TerminationMode;
use crate::location::Location;
use crate::output::stats::CrawlStatistics;
use crate::state::ResultStore;
use chrono::{DateTime, Utc};

/// Summary of one finished crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub workers: usize,
    pub termination: TerminationMode,
    pub config_hash: Option<String>,
    pub stats: CrawlStatistics,

    /// Every stored location with its content size in bytes, sorted by location
    pub pages: Vec<(Location, usize)>,
}

impl CrawlSummary {
    /// Builds a summary from the final result store
    pub fn new(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        workers: usize,
        termination: TerminationMode,
        stats: CrawlStatistics,
        results: &ResultStore,
    ) -> Self {
        let pages = results
            .sorted_locations()
            .into_iter()
            .filter_map(|location| {
                let size = results.get(&location)?.len();
                Some((location, size))
            })
            .collect();

        Self {
            started_at,
            finished_at,
            workers,
            termination,
            config_hash: None,
            stats,
            pages,
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Wall-clock duration of the run; zero if the clock went backwards
    pub fn duration(&self) -> chrono::Duration {
        (self.finished_at - self.started_at).max(chrono::Duration::zero())
    }

    /// Total bytes of stored content
    pub fn total_bytes(&self) -> usize {
        self.pages.iter().map(|(_, size)| size).sum()
    }
}
