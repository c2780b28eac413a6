//! Crawl coordinator
//!
//! Owns the shared structures and the worker pool lifecycle:
//! - Seeding the frontier through the visited-set
//! - Validating run parameters before any worker exists
//! - Spawning the workers and joining them once the crawl is quiescent
//!
//! The coordinator never polls worker state. Workers decide quiescence among
//! themselves through the shared termination tracker, and the coordinator
//! simply waits for every one of them to exit.

use crate::config::validate_run_parameters;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::Extractor;
use crate::crawler::termination::{Quiescence, TerminationMode};
use crate::crawler::worker::{Worker, WorkerContext, WorkerSummary};
use crate::location::Location;
use crate::output::{CrawlCounters, CrawlStatistics};
use crate::state::{ResultStore, VisitedSet};
use crate::{ConfigError, CrawlError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Main crawler coordinator structure
pub struct Coordinator<F, E> {
    fetcher: Arc<F>,
    extractor: Arc<E>,
    visited: VisitedSet,
    frontier: Frontier,
    results: ResultStore,
    counters: Arc<CrawlCounters>,
    termination: TerminationMode,
    /// Termination tracker of the run in progress, if any
    active: Mutex<Option<Arc<Quiescence>>>,
}

impl<F, E> Coordinator<F, E>
where
    F: Fetcher + 'static,
    E: Extractor + 'static,
{
    /// Creates a coordinator with empty shared state
    ///
    /// # Example
    ///
    /// ```
    /// use tidepool::crawler::{Coordinator, StaticFetcher};
    /// use tidepool::{Content, Location};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let fetcher = StaticFetcher::new().page(Location::new("A")?, "leaf");
    /// let extractor = |_: &Content| Vec::<Location>::new();
    ///
    /// let coordinator = Coordinator::new(fetcher, extractor);
    /// coordinator.seed(["A"])?;
    /// let results = coordinator.run(4, Duration::from_millis(100)).await?;
    /// assert_eq!(results.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(fetcher: F, extractor: E) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            visited: VisitedSet::new(),
            frontier: Frontier::new(),
            results: ResultStore::new(),
            counters: Arc::new(CrawlCounters::new()),
            termination: TerminationMode::default(),
            active: Mutex::new(None),
        }
    }

    /// Selects the quiescence protocol used by `run`
    pub fn with_termination(mut self, termination: TerminationMode) -> Self {
        self.termination = termination;
        self
    }

    /// Seeds the frontier with raw location identifiers
    ///
    /// The whole batch is validated first: if any entry is malformed nothing
    /// is admitted. Already-admitted locations are skipped. Seeding while
    /// `run` is in progress is allowed: the new locations join that run, unless
    /// it has already been declared finished, in which case they stay queued
    /// for the next one.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of locations newly admitted
    /// * `Err(ConfigError)` - A seed was blank
    pub fn seed<I, S>(&self, raw: I) -> Result<usize, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let locations = raw
            .into_iter()
            .map(Location::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.seed_locations(locations))
    }

    /// Seeds the frontier with already-built locations
    pub fn seed_locations<I>(&self, locations: I) -> usize
    where
        I: IntoIterator<Item = Location>,
    {
        locations
            .into_iter()
            .map(|location| self.admit_seed(location))
            .filter(|admitted| *admitted)
            .count()
    }

    /// Admits one seed location; returns false if it was already known
    pub fn admit_seed(&self, location: Location) -> bool {
        // Held across admit and push so a starting run counts this seed
        // exactly once, either in its initial size or here.
        let active = self.active();
        if self.visited.admit(location.clone()) {
            tracing::debug!("Seeded {}", location);
            if let Some(quiescence) = active.as_ref() {
                quiescence.location_admitted();
            }
            self.frontier.push(location);
            self.counters.record_seeded();
            true
        } else {
            tracing::debug!("Seed {} already admitted, skipping", location);
            self.counters.record_duplicate();
            false
        }
    }

    /// Runs the crawl to quiescence
    ///
    /// Spawns `worker_count` workers sharing this coordinator's frontier,
    /// visited-set and result store, waits for all of them to stop, and
    /// returns the result store.
    ///
    /// # Returns
    ///
    /// * `Ok(ResultStore)` - Everything fetched successfully; possibly partial
    /// * `Err(CrawlError::Config)` - Invalid parameters; no worker was started
    /// * `Err(CrawlError::Worker)` - A worker panicked; the others were still joined
    pub async fn run(
        &self,
        worker_count: usize,
        idle_timeout: Duration,
    ) -> Result<ResultStore, CrawlError> {
        validate_run_parameters(worker_count, idle_timeout)?;

        let quiescence = {
            let mut active = self.active();
            if active.is_some() {
                return Err(CrawlError::Config(ConfigError::Validation(
                    "a crawl is already running on this coordinator".to_string(),
                )));
            }
            let quiescence = Arc::new(Quiescence::new(
                self.termination,
                worker_count,
                self.frontier.len(),
            ));
            *active = Some(quiescence.clone());
            quiescence
        };
        let active_run = ActiveRun {
            slot: &self.active,
        };
        let context = Arc::new(WorkerContext {
            fetcher: self.fetcher.clone(),
            extractor: self.extractor.clone(),
            visited: self.visited.clone(),
            frontier: self.frontier.clone(),
            results: self.results.clone(),
            counters: self.counters.clone(),
            quiescence: quiescence.clone(),
            idle_timeout,
        });

        tracing::info!(
            "Starting crawl: {} workers, {} queued, idle timeout {:?}, {} termination",
            worker_count,
            self.frontier.len(),
            idle_timeout,
            quiescence.mode()
        );

        let start_time = Instant::now();
        quiescence.check_initial();

        let handles: Vec<_> = (0..worker_count)
            .map(|id| tokio::spawn(Worker::new(id, context.clone()).run()))
            .collect();

        let mut summaries: Vec<WorkerSummary> = Vec::with_capacity(worker_count);
        let mut failure = None;
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(summary) => {
                    tracing::debug!(
                        "Worker {} joined: {} processed, {} failed, {} idle polls",
                        summary.id,
                        summary.processed,
                        summary.failed,
                        summary.idle_polls
                    );
                    summaries.push(summary);
                }
                Err(e) => {
                    tracing::error!("Worker {} did not finish cleanly: {}", id, e);
                    failure.get_or_insert(CrawlError::Worker {
                        id,
                        message: e.to_string(),
                    });
                }
            }
        }
        drop(active_run);

        if !self.frontier.is_empty() {
            tracing::warn!(
                "Crawl ended with {} locations still queued",
                self.frontier.len()
            );
        }

        let stats = self.counters.snapshot();
        let idle_polls: u64 = summaries.iter().map(|s| s.idle_polls).sum();
        tracing::info!(
            "Crawl completed: {} fetched, {} failed, {} idle polls across {} workers in {:?}",
            stats.fetched,
            stats.failed,
            idle_polls,
            summaries.len(),
            start_time.elapsed()
        );

        if let Some(e) = failure {
            return Err(e);
        }

        Ok(self.results.clone())
    }

    /// The result store shared with the workers
    pub fn results(&self) -> ResultStore {
        self.results.clone()
    }

    pub fn statistics(&self) -> CrawlStatistics {
        self.counters.snapshot()
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn termination(&self) -> TerminationMode {
        self.termination
    }

    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    fn active(&self) -> MutexGuard<'_, Option<Arc<Quiescence>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the coordinator's active run when `run` returns or is dropped
struct ActiveRun<'a> {
    slot: &'a Mutex<Option<Arc<Quiescence>>>,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
