//! Markdown summary generation
//!
//! Renders a human-readable report of a crawl run: run metadata, fetch
//! statistics and the stored pages.

use crate::output::summary::CrawlSummary;
use crate::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Pages listed before the report switches to a count
const MAX_LISTED_PAGES: usize = 200;

/// Writes a markdown summary to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();
    let stats = &summary.stats;

    md.push_str("# Tidepool Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    let duration = summary.duration();
    md.push_str(&format!(
        "- **Duration**: {}.{:03} seconds\n",
        duration.num_seconds(),
        duration.num_milliseconds() % 1000
    ));
    md.push_str(&format!("- **Workers**: {}\n", summary.workers));
    md.push_str(&format!("- **Termination**: {}\n", summary.termination));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Seeded | {} |\n", stats.seeded));
    md.push_str(&format!("| Discovered | {} |\n", stats.discovered));
    md.push_str(&format!("| Duplicates | {} |\n", stats.duplicates));
    md.push_str(&format!("| Fetched | {} |\n", stats.fetched));
    md.push_str(&format!("| Failed | {} |\n", stats.failed));
    md.push_str(&format!("| Never attempted | {} |\n\n", stats.unattempted()));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        stats.success_rate()
    ));
    md.push_str(&format!(
        "- **Content Stored**: {} bytes\n\n",
        summary.total_bytes()
    ));

    // Pages
    if !summary.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| Location | Bytes |\n");
        md.push_str("|----------|-------|\n");
        for (location, size) in summary.pages.iter().take(MAX_LISTED_PAGES) {
            md.push_str(&format!("| {} | {} |\n", location, size));
        }
        if summary.pages.len() > MAX_LISTED_PAGES {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.pages.len() - MAX_LISTED_PAGES
            ));
        }
        md.push('\n');
    }

    md
}
