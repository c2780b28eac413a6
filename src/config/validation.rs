use crate::config::types::{Config, CrawlerConfig, FetchConfig, OutputConfig, SeedConfig};
use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Upper bound on the configured worker pool
pub const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_seeds(&config.seeds)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the parameters of a single crawl run
///
/// Checked before any worker is spawned.
pub fn validate_run_parameters(workers: usize, idle_timeout: Duration) -> Result<(), ConfigError> {
    if workers == 0 {
        return Err(ConfigError::Validation(
            "worker count must be at least 1".to_string(),
        ));
    }

    if idle_timeout.is_zero() {
        return Err(ConfigError::Validation(
            "idle timeout must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_run_parameters(config.workers, config.idle_timeout())?;

    if config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-ms must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed URLs: absolute, http or https, with a host
fn validate_seeds(seeds: &SeedConfig) -> Result<(), ConfigError> {
    for seed in &seeds.urls {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' has no host",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if matches!(&config.summary_path, Some(path) if path.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
