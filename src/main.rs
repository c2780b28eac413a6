//! Tidepool main entry point
//!
//! This is the command-line interface for the Tidepool crawl engine.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use tidepool::config::{load_config_with_hash, validate, Config};
use tidepool::crawler::web_coordinator;
use tidepool::output::{generate_markdown_summary, print_results, print_statistics, CrawlSummary};
use tracing_subscriber::EnvFilter;

/// Tidepool: a concurrent crawling engine
///
/// Tidepool drains a frontier of seed URLs with a fixed pool of workers,
/// fetching every reachable page exactly once and following the links it
/// finds until no work remains.
#[derive(Parser, Debug)]
#[command(name = "tidepool")]
#[command(version)]
#[command(about = "A concurrent crawling engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the configured number of workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Override the configured idle timeout
    #[arg(long, value_name = "MS")]
    idle_timeout_ms: Option<u64>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Print only the crawled URLs, not their content
    #[arg(long)]
    no_content: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli).context("Invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config, &config_hash, cli.no_content).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tidepool=info,warn"),
            1 => EnvFilter::new("tidepool=debug,info"),
            2 => EnvFilter::new("tidepool=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Applies `--workers` / `--idle-timeout-ms` and re-validates
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), tidepool::ConfigError> {
    if let Some(workers) = cli.workers {
        tracing::debug!("Overriding workers: {} -> {}", config.crawler.workers, workers);
        config.crawler.workers = workers;
    }
    if let Some(idle_timeout_ms) = cli.idle_timeout_ms {
        tracing::debug!(
            "Overriding idle timeout: {}ms -> {}ms",
            config.crawler.idle_timeout_ms,
            idle_timeout_ms
        );
        config.crawler.idle_timeout_ms = idle_timeout_ms;
    }
    validate(config)
}

/// Handles the --dry-run mode: shows the validated configuration and seeds
fn handle_dry_run(config: &Config) {
    println!("=== Tidepool Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Idle timeout: {}ms", config.crawler.idle_timeout_ms);
    println!("  Termination: {}", config.crawler.termination);

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Request timeout: {}ms", config.fetch.request_timeout_ms);
    println!("  Connect timeout: {}ms", config.fetch.connect_timeout_ms);
    println!("  Same domain only: {}", config.extract.same_domain_only);

    println!("\nSeeds ({}):", config.seeds.urls.len());
    for seed in &config.seeds.urls {
        println!("  - {}", seed);
    }

    if let Some(path) = &config.output.summary_path {
        println!("\nSummary: {}", path);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str, no_content: bool) -> anyhow::Result<()> {
    let coordinator = web_coordinator(config).context("Failed to set up crawl")?;

    let started_at = Utc::now();
    let results = coordinator
        .run(config.crawler.workers, config.crawler.idle_timeout())
        .await
        .context("Crawl failed")?;
    let finished_at = Utc::now();

    let show_content = config.output.print_content && !no_content;
    print_results(&results, show_content).context("Failed to print results")?;

    let stats = coordinator.statistics();
    println!();
    print_statistics(&stats);

    if let Some(path) = &config.output.summary_path {
        let summary = CrawlSummary::new(
            started_at,
            finished_at,
            config.crawler.workers,
            config.crawler.termination,
            stats,
            &results,
        )
        .with_config_hash(config_hash);

        generate_markdown_summary(&summary, Path::new(path))
            .with_context(|| format!("Failed to write summary to {}", path))?;
        tracing::info!("Summary written to {}", path);
    }

    Ok(())
}
