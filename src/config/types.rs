use crate::crawler::TerminationMode;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Tidepool
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    pub seeds: SeedConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    pub workers: usize,

    /// How long a worker waits on an empty frontier before reporting idle (milliseconds)
    #[serde(rename = "idle-timeout-ms")]
    pub idle_timeout_ms: u64,

    /// Quiescence protocol
    #[serde(default)]
    pub termination: TerminationMode,
}

impl CrawlerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Connection timeout (milliseconds)
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("tidepool/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
        }
    }
}

/// Link extraction configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractConfig {
    /// Only follow links on the same domain as the page they appear on
    #[serde(rename = "same-domain-only", default)]
    pub same_domain_only: bool,
}

/// Seed locations
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// URLs to start crawling from
    pub urls: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print each page's content after the crawl
    #[serde(rename = "print-content")]
    pub print_content: bool,

    /// Path to the markdown summary file, if one should be written
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            print_content: true,
            summary_path: None,
        }
    }
}
