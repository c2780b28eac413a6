//! Quiescence detection
//!
//! Decides when a crawl is finished and broadcasts the shutdown signal to
//! every worker. Two protocols are available, see [`TerminationMode`].

use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// How the crawl decides that no more work will arrive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationMode {
    /// Count admitted-but-unfinished locations; finish when the count hits zero
    ///
    /// A location is counted from its admission until the worker that popped
    /// it has pushed every location it discovered. The count can only reach
    /// zero when the frontier is empty and no worker holds a location, so
    /// the crawl never ends early.
    #[default]
    InFlight,

    /// Finish once every worker's most recent poll timed out
    ///
    /// A successful pop anywhere clears every idle mark. This is the classic
    /// timeout-based quiescence: the window between a worker popping a
    /// location and clearing the marks is not covered, so a crawl can in rare
    /// cases be declared finished just as new work is discovered. Locations
    /// pushed after that point are never fetched.
    IdleTimeout,
}

impl TerminationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InFlight => "in-flight",
            Self::IdleTimeout => "idle-timeout",
        }
    }
}

impl fmt::Display for TerminationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared termination tracker for one crawl run
#[derive(Debug)]
pub(crate) struct Quiescence {
    mode: TerminationMode,
    /// Admitted locations not yet fully processed
    pending: AtomicUsize,
    /// Per-worker "last poll timed out" marks
    idle: Mutex<IdleMarks>,
    shutdown: watch::Sender<bool>,
}

#[derive(Debug)]
struct IdleMarks {
    marked: Vec<bool>,
    /// Workers that have left their loop stay marked for good
    retired: Vec<bool>,
    count: usize,
}

impl Quiescence {
    /// Creates a tracker for `workers` workers with `pending` locations already queued
    pub fn new(mode: TerminationMode, workers: usize, pending: usize) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            mode,
            pending: AtomicUsize::new(pending),
            idle: Mutex::new(IdleMarks {
                marked: vec![false; workers],
                retired: vec![false; workers],
                count: 0,
            }),
            shutdown,
        }
    }

    pub fn mode(&self) -> TerminationMode {
        self.mode
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Declares the crawl finished; idempotent
    pub fn shutdown(&self) {
        self.shutdown.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        });
    }

    /// Finishes immediately if there was nothing to do from the start
    pub fn check_initial(&self) {
        if self.mode == TerminationMode::InFlight && self.pending.load(Ordering::SeqCst) == 0 {
            tracing::debug!("Nothing queued, crawl is trivially complete");
            self.shutdown();
        }
    }

    /// Records a newly admitted location; call before pushing it
    pub fn location_admitted(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    /// Records that a popped location has been fully processed
    pub fn location_finished(&self) {
        let previous = match self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(previous) => previous,
            Err(_) => {
                tracing::error!("Location finished with nothing pending");
                return;
            }
        };
        if self.mode == TerminationMode::InFlight && previous == 1 {
            tracing::debug!("No locations in flight, crawl complete");
            self.shutdown();
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Called after a successful pop; clears every idle mark
    pub fn worker_active(&self) {
        if self.mode != TerminationMode::IdleTimeout {
            return;
        }
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.count == 0 {
            return;
        }
        let IdleMarks {
            marked, retired, ..
        } = &mut *idle;
        for (mark, retired) in marked.iter_mut().zip(retired.iter()) {
            *mark = *retired;
        }
        idle.count = idle.retired.iter().filter(|r| **r).count();
    }

    /// Called when a worker's poll times out
    ///
    /// Returns the number of workers currently marked idle.
    pub fn worker_idle(&self, worker_id: usize) -> usize {
        self.mark_idle(worker_id, false)
    }

    /// Called when a worker leaves its loop, normally or by panicking
    ///
    /// A retired worker counts as idle from then on, so the remaining workers
    /// can still reach quiescence without it.
    pub fn worker_retired(&self, worker_id: usize) {
        self.mark_idle(worker_id, true);
    }

    fn mark_idle(&self, worker_id: usize, retire: bool) -> usize {
        if self.mode != TerminationMode::IdleTimeout {
            return 0;
        }
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if worker_id >= idle.marked.len() {
            return idle.count;
        }
        if retire {
            idle.retired[worker_id] = true;
        }
        if !idle.marked[worker_id] {
            idle.marked[worker_id] = true;
            idle.count += 1;
        }
        let count = idle.count;
        let workers = idle.marked.len();
        drop(idle);

        if count == workers {
            tracing::debug!("All {} workers idle, crawl complete", workers);
            self.shutdown();
        }
        count
    }
}

/// Decrements the pending count when dropped
///
/// Holding one for the whole processing cycle keeps the count accurate even
/// if a fetcher or extractor panics.
pub(crate) struct PendingGuard<'a> {
    quiescence: &'a Quiescence,
}

impl<'a> PendingGuard<'a> {
    pub fn new(quiescence: &'a Quiescence) -> Self {
        Self { quiescence }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.quiescence.location_finished();
    }
}
