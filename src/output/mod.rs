//! Output module for crawl results and reports
//!
//! This module handles:
//! - Live crawl counters and their statistics snapshots
//! - Printing the crawled pages to stdout
//! - Generating markdown summaries of a run

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, CrawlCounters, CrawlStatistics};
pub use summary::CrawlSummary;

use crate::state::ResultStore;
use std::io::{self, Write};

const RULE: &str = "----------------------------------------";

/// Prints every stored page to stdout, sorted by location
pub fn print_results(results: &ResultStore, show_content: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(results, show_content, &mut out)
}

/// Writes the page listing printed by [`print_results`]
pub fn write_results<W: Write>(
    results: &ResultStore,
    show_content: bool,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "Crawled pages: {}", results.len())?;

    for location in results.sorted_locations() {
        writeln!(out, "URL: {}", location)?;
        if show_content {
            if let Some(content) = results.get(&location) {
                writeln!(out, "Content:\n{}", content.body())?;
            }
        }
        writeln!(out, "{}", RULE)?;
    }

    out.flush()
}
