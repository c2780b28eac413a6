//! Shared crawl state
//!
//! # Components
//!
//! - `VisitedSet`: the deduplication authority; every location is admitted at most once
//! - `ResultStore`: fetched content, written at most once per location
//! - `WorkerState`: the phases a worker moves through while processing the frontier
//!
//! `VisitedSet` and `ResultStore` are cheap-to-clone handles onto one shared
//! container, so the coordinator and every worker can hold their own copy.

mod results;
mod visited;
mod worker_state;

pub use results::ResultStore;
pub use visited::VisitedSet;
pub use worker_state::WorkerState;
