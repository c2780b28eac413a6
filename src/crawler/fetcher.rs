//! Content fetchers
//!
//! This module provides:
//! - The [`Fetcher`] trait workers call for every popped location
//! - [`HttpFetcher`], a reqwest-backed implementation for web crawls
//! - [`StaticFetcher`], a fixed table of pages that counts its calls

use crate::config::FetchConfig;
use crate::location::{Content, Location};
use crate::{FetchError, FetchFailure};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Retrieves the content of a location
///
/// A failed fetch is reported per location; the worker logs it and moves on.
/// Fetches are never cancelled by the crawl, so implementations should
/// enforce their own timeouts.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, location: &Location) -> Result<Content, FetchError>;
}

/// Builds an HTTP client from the fetch configuration
///
/// # Example
///
/// ```no_run
/// use tidepool::config::FetchConfig;
/// use tidepool::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches locations over HTTP(S)
///
/// Redirects are followed. Any non-2xx final status is a failure. The
/// returned content remembers the final URL so relative links resolve
/// against the page that was actually served.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, location: &Location) -> Result<Content, FetchError> {
        let fail = |cause| FetchError::new(location.clone(), cause);

        let url = location
            .to_url()
            .ok_or_else(|| fail(FetchFailure::Other("location is not a URL".to_string())))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(classify_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(FetchFailure::Status(status.as_u16())));
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| fail(classify_error(&e)))?;

        tracing::debug!("Fetched {} ({} bytes)", final_url, body.len());
        Ok(Content::with_source(body, final_url))
    }
}

fn classify_error(error: &reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else if error.is_connect() {
        FetchFailure::Network("Connection refused".to_string())
    } else {
        FetchFailure::Network(error.to_string())
    }
}

/// A fetcher backed by a fixed table of pages
///
/// Locations missing from the table fail with [`FetchFailure::NotFound`].
/// Every call is counted per location, which makes "fetched at most once"
/// directly observable.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: HashMap<Location, Option<Content>>,
    calls: DashMap<Location, usize>,
    delay: Option<Duration>,
    delays: HashMap<Location, Duration>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `content` for `location`
    pub fn page(mut self, location: Location, content: impl Into<Content>) -> Self {
        self.pages.insert(location, Some(content.into()));
        self
    }

    /// Makes every fetch of `location` fail
    pub fn failure(mut self, location: Location) -> Self {
        self.pages.insert(location, None);
        self
    }

    /// Sleeps before answering each fetch
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleeps before answering fetches of `location`, overriding [`Self::delay`]
    pub fn delay_for(mut self, location: Location, delay: Duration) -> Self {
        self.delays.insert(location, delay);
        self
    }

    /// Number of times `location` has been fetched
    pub fn calls(&self, location: &Location) -> usize {
        self.calls.get(location).map(|count| *count).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Largest call count seen for any single location
    pub fn max_calls_per_location(&self) -> usize {
        self.calls
            .iter()
            .map(|entry| *entry.value())
            .max()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, location: &Location) -> Result<Content, FetchError> {
        *self.calls.entry(location.clone()).or_insert(0) += 1;

        if let Some(delay) = self.delays.get(location).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }

        match self.pages.get(location) {
            Some(Some(content)) => Ok(content.clone()),
            Some(None) => Err(FetchError::new(
                location.clone(),
                FetchFailure::Other("configured to fail".to_string()),
            )),
            None => Err(FetchError::new(location.clone(), FetchFailure::NotFound)),
        }
    }
}
