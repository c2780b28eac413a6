//! Frontier of locations awaiting a fetch
//!
//! An unbounded FIFO shared by every worker. Pushing never blocks; popping
//! waits up to a timeout for work to appear. The queue lock is never held
//! across an await point.

use crate::location::Location;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Shared handle onto the crawl frontier
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    inner: Arc<FrontierInner>,
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: Mutex<VecDeque<Location>>,
    available: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a location to the tail
    ///
    /// Callers are expected to have admitted the location through the
    /// visited-set first; the frontier does not deduplicate.
    pub fn push(&self, location: Location) {
        self.queue().push_back(location);
        self.inner.available.notify_one();
    }

    /// Removes the head immediately if there is one
    pub fn try_pop(&self) -> Option<Location> {
        self.queue().pop_front()
    }

    /// Waits up to `timeout` for a location
    ///
    /// Returns `None` once the timeout elapses with the queue still empty.
    /// Each location is handed to exactly one caller. Dropping the returned
    /// future never loses a location.
    pub async fn pop_with_timeout(&self, timeout: Duration) -> Option<Location> {
        let deadline = Instant::now() + timeout;

        loop {
            let notified = self.inner.available.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await is not missed.
            notified.as_mut().enable();

            if let Some(location) = self.try_pop() {
                // A single wakeup may have covered several pushes; pass it on.
                if !self.is_empty() {
                    self.inner.available.notify_one();
                }
                return Some(location);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.try_pop();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Location>> {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
