//! Crawl worker
//!
//! Every worker runs the same loop over the shared structures:
//!
//! 1. Poll the frontier (bounded by the idle timeout)
//! 2. Fetch the popped location
//! 3. Store the content if the fetch succeeded
//! 4. Extract candidate locations and push the ones admitted for the first time
//!
//! A worker always finishes the cycle it started before it looks at the
//! shutdown signal. Fetch errors are logged and the location is dropped.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::Extractor;
use crate::crawler::termination::{PendingGuard, Quiescence};
use crate::location::{Content, Location};
use crate::output::CrawlCounters;
use crate::state::{ResultStore, VisitedSet, WorkerState};
use std::sync::Arc;
use std::time::Duration;

/// Everything a worker shares with its siblings and the coordinator
pub(crate) struct WorkerContext<F, E> {
    pub fetcher: Arc<F>,
    pub extractor: Arc<E>,
    pub visited: VisitedSet,
    pub frontier: Frontier,
    pub results: ResultStore,
    pub counters: Arc<CrawlCounters>,
    pub quiescence: Arc<Quiescence>,
    pub idle_timeout: Duration,
}

/// What a single worker did during a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub id: usize,
    /// Locations popped from the frontier
    pub processed: u64,
    /// Of those, fetches that failed
    pub failed: u64,
    /// Polls that timed out
    pub idle_polls: u64,
}

pub(crate) struct Worker<F, E> {
    id: usize,
    context: Arc<WorkerContext<F, E>>,
    state: WorkerState,
    summary: WorkerSummary,
}

impl<F, E> Worker<F, E>
where
    F: Fetcher,
    E: Extractor,
{
    pub fn new(id: usize, context: Arc<WorkerContext<F, E>>) -> Self {
        Self {
            id,
            context,
            state: WorkerState::Polling,
            summary: WorkerSummary {
                id,
                ..Default::default()
            },
        }
    }

    /// Runs until the crawl is declared finished
    pub async fn run(mut self) -> WorkerSummary {
        let context = self.context.clone();
        let _retire = RetireGuard {
            id: self.id,
            quiescence: &context.quiescence,
        };
        let mut shutdown = context.quiescence.subscribe();

        tracing::debug!("Worker {} started", self.id);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let popped = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                popped = context.frontier.pop_with_timeout(context.idle_timeout) => popped,
            };

            match popped {
                Some(location) => self.process(location).await,
                None => self.idle(),
            }
        }

        self.transition(WorkerState::Stopped);
        tracing::debug!("Worker {} stopped", self.id);
        self.summary
    }

    /// One full fetch/store/extract/push cycle for a popped location
    async fn process(&mut self, location: Location) {
        let context = self.context.clone();
        let _pending = PendingGuard::new(&context.quiescence);
        context.quiescence.worker_active();
        self.summary.processed += 1;

        self.transition(WorkerState::Fetching);
        tracing::debug!("Worker {} fetching {}", self.id, location);

        let content = match context.fetcher.fetch(&location).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Worker {}: {}", self.id, e);
                context.counters.record_failed();
                self.summary.failed += 1;
                self.transition(WorkerState::Polling);
                return;
            }
        };

        context.counters.record_fetched();
        if !context.results.put_if_absent(location.clone(), content.clone()) {
            tracing::warn!("Result for {} was already recorded, keeping the first", location);
        }
        self.admit_served_location(&location, &content);

        self.transition(WorkerState::Extracting);
        let mut admitted = 0;
        for candidate in context.extractor.extract(&content) {
            if context.visited.admit(candidate.clone()) {
                context.quiescence.location_admitted();
                context.frontier.push(candidate);
                context.counters.record_discovered();
                admitted += 1;
            } else {
                context.counters.record_duplicate();
            }
        }

        if admitted > 0 {
            tracing::debug!(
                "Worker {} queued {} new locations from {}",
                self.id,
                admitted,
                location
            );
        }

        self.transition(WorkerState::Polling);
    }

    /// Marks the URL the content was actually served from as visited
    ///
    /// After a redirect the page is stored under the requested location; the
    /// final URL must not be fetched again under a second key.
    fn admit_served_location(&self, requested: &Location, content: &Content) {
        let Some(source) = content.source() else {
            return;
        };
        let Ok(served) = Location::parse_url(source.as_str()) else {
            return;
        };
        if &served != requested && self.context.visited.admit(served.clone()) {
            tracing::debug!("{} was served from {}", requested, served);
        }
    }

    /// The last poll timed out: report it, then go back to polling
    fn idle(&mut self) {
        self.transition(WorkerState::Idle);
        self.summary.idle_polls += 1;

        let idle_workers = self.context.quiescence.worker_idle(self.id);
        tracing::trace!("Worker {} idle ({} idle overall)", self.id, idle_workers);

        self.transition(WorkerState::Polling);
    }

    fn transition(&mut self, next: WorkerState) {
        if !self.state.can_transition_to(next) {
            tracing::error!(
                "Worker {} made an invalid transition: {} -> {}",
                self.id,
                self.state,
                next
            );
        }
        tracing::trace!("Worker {}: {} -> {}", self.id, self.state, next);
        self.state = next;
    }
}

/// Marks the worker as permanently idle when its loop ends, even by panic
struct RetireGuard<'a> {
    id: usize,
    quiescence: &'a Quiescence,
}

impl Drop for RetireGuard<'_> {
    fn drop(&mut self) {
        self.quiescence.worker_retired(self.id);
    }
}
