use crate::location::Location;
use dashmap::DashSet;
use std::sync::Arc;

/// Set of every location ever admitted to the frontier
///
/// Admission happens before a fetch, so a location stays "visited" even if
/// its fetch later fails. Failed locations are never retried.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    admitted: Arc<DashSet<Location>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks and records a location
    ///
    /// Returns true only for the first admission of `location`. When several
    /// workers race on the same location, exactly one of them gets `true`.
    pub fn admit(&self, location: Location) -> bool {
        self.admitted.insert(location)
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.admitted.contains(location)
    }

    pub fn len(&self) -> usize {
        self.admitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admitted.is_empty()
    }
}
