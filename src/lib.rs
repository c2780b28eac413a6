//! Tidepool: a concurrent crawling engine
//!
//! A fixed pool of workers drains a shared frontier, fetches each location
//! through a pluggable [`crawler::Fetcher`], records the content exactly once,
//! and feeds newly discovered locations back through a shared visited-set.

pub mod config;
pub mod crawler;
pub mod location;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Tidepool operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker {id} failed: {message}")]
    Worker { id: usize, message: String },
}

/// Configuration-specific errors
///
/// These are always reported before any worker is spawned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Malformed location: {0:?}")]
    MalformedLocation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// A failed fetch of a single location
///
/// Fetch errors are per-location and never abort a crawl: the worker logs
/// them and moves on, and the location is not retried.
#[derive(Debug, Error)]
#[error("Failed to fetch {location}: {cause}")]
pub struct FetchError {
    pub location: location::Location,
    pub cause: FetchFailure,
}

impl FetchError {
    pub fn new(location: location::Location, cause: FetchFailure) -> Self {
        Self { location, cause }
    }
}

/// Reason a fetch failed
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("No content available")]
    NotFound,

    #[error("{0}")]
    Other(String),
}

/// Errors raised while writing reports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Tidepool operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for report generation
pub type OutputResult<T> = std::result::Result<T, OutputError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Extractor, Fetcher, TerminationMode};
pub use location::{Content, Location};
pub use state::{ResultStore, VisitedSet, WorkerState};
pub use crate::url::{extract_domain, normalize_url};
