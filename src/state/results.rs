use crate::location::{Content, Location};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Concurrent store of fetched content, keyed by location
///
/// Only successful fetches are recorded. Each key is written at most once;
/// later writes for the same key are discarded.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    entries: Arc<DashMap<Location, Content>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `content` unless `location` already has an entry
    ///
    /// Returns true if the entry was newly inserted.
    pub fn put_if_absent(&self, location: Location, content: Content) -> bool {
        match self.entries.entry(location) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(content);
                true
            }
        }
    }

    pub fn get(&self, location: &Location) -> Option<Content> {
        self.entries.get(location).map(|entry| entry.value().clone())
    }

    /// Copies every entry into a plain map
    ///
    /// Iteration order of the returned map carries no meaning.
    pub fn snapshot(&self) -> HashMap<Location, Content> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Locations with content, sorted for stable reporting
    pub fn sorted_locations(&self) -> Vec<Location> {
        let mut locations: Vec<Location> =
            self.entries.iter().map(|entry| entry.key().clone()).collect();
        locations.sort();
        locations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(raw: &str) -> Location {
        Location::new(raw).unwrap()
    }

    #[test]
    fn test_first_writer_wins() {
        let store = ResultStore::new();
        assert!(store.put_if_absent(loc("A"), Content::new("first")));
        assert!(!store.put_if_absent(loc("A"), Content::new("second")));

        assert_eq!(store.get(&loc("A")), Some(Content::new("first")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = ResultStore::new();
        assert!(store.get(&loc("nope")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = ResultStore::new();
        store.put_if_absent(loc("A"), Content::new("a"));
        store.put_if_absent(loc("B"), Content::new("b"));

        let snapshot = store.snapshot();
        store.put_if_absent(loc("C"), Content::new("c"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(&loc("B")), Some(&Content::new("b")));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_sorted_locations() {
        let store = ResultStore::new();
        for key in ["c", "a", "b"] {
            store.put_if_absent(loc(key), Content::new(key));
        }
        assert_eq!(store.sorted_locations(), vec![loc("a"), loc("b"), loc("c")]);
    }

    #[test]
    fn test_concurrent_writers_for_distinct_keys() {
        let store = ResultStore::new();
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let key = format!("w{}-{}", worker, i);
                        assert!(store.put_if_absent(loc(&key), Content::new(key.clone())));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 400);
    }
}
