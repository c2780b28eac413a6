//! Crawl statistics
//!
//! Workers bump lock-free counters while the crawl runs; reports read a
//! point-in-time [`CrawlStatistics`] snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the coordinator and every worker
#[derive(Debug, Default)]
pub struct CrawlCounters {
    seeded: AtomicU64,
    discovered: AtomicU64,
    duplicates: AtomicU64,
    fetched: AtomicU64,
    failed: AtomicU64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_seeded(&self) {
        self.seeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discovered(&self) {
        self.discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CrawlStatistics {
        CrawlStatistics {
            seeded: self.seeded.load(Ordering::Relaxed),
            discovered: self.discovered.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Seed locations admitted before the crawl started
    pub seeded: u64,

    /// Locations admitted from extracted content
    pub discovered: u64,

    /// Admissions rejected because the location was already known
    pub duplicates: u64,

    /// Successful fetches
    pub fetched: u64,

    /// Failed fetches (logged and dropped)
    pub failed: u64,
}

impl CrawlStatistics {
    /// Every location ever admitted
    pub fn admitted(&self) -> u64 {
        self.seeded + self.discovered
    }

    /// Fetch attempts, successful or not
    pub fn attempted(&self) -> u64 {
        self.fetched + self.failed
    }

    /// Admitted locations that were never attempted
    pub fn unattempted(&self) -> u64 {
        self.admitted().saturating_sub(self.attempted())
    }

    /// Percentage of attempted fetches that succeeded
    pub fn success_rate(&self) -> f64 {
        let attempted = self.attempted();
        if attempted == 0 {
            return 0.0;
        }
        (self.fetched as f64 / attempted as f64) * 100.0
    }
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");
    println!("Locations admitted: {}", stats.admitted());
    println!("  Seeded:      {}", stats.seeded);
    println!("  Discovered:  {}", stats.discovered);
    println!("  Duplicates:  {}", stats.duplicates);
    println!();
    println!("Fetch attempts: {}", stats.attempted());
    println!("  Succeeded:   {}", stats.fetched);
    println!("  Failed:      {}", stats.failed);
    println!("  Success rate: {:.2}%", stats.success_rate());

    let unattempted = stats.unattempted();
    if unattempted > 0 {
        println!("\nNever attempted: {}", unattempted);
    }
}
