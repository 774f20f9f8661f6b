//! Result aggregation under a single lock
//!
//! Workers share one [`ResultAggregator`] per fan-out call and record their
//! outcome as they finish. Writes are serialized by an exclusive lock; after
//! the scheduler's completion barrier no writers remain and the map can be
//! taken out wholesale.

use super::{Outcome, ResultMap};
use parking_lot::Mutex;

/// Shared mapping from indicator key to lookup outcome.
///
/// An entry is written at most once per distinct key; duplicate keys in the
/// input overwrite each other (atomic replace per key).
#[derive(Debug, Default)]
pub struct ResultAggregator<R> {
    entries: Mutex<ResultMap<R>>,
}

impl<R> ResultAggregator<R> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(ResultMap::new()),
        }
    }

    /// Record the outcome for a key.
    pub fn set(&self, key: String, outcome: Outcome<R>) {
        self.entries.lock().insert(key, outcome);
    }

    /// Number of recorded outcomes.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Take the accumulated map, leaving the aggregator empty.
    ///
    /// Called by the scheduler after the completion barrier.
    pub fn take(&self) -> ResultMap<R> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl<R: Clone> ResultAggregator<R> {
    /// Fetch a copy of the outcome for a key, if one was recorded.
    pub fn get(&self, key: &str) -> Option<Outcome<R>> {
        self.entries.lock().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let aggregator = ResultAggregator::new();
        aggregator.set("a".to_string(), Outcome::Report(1));

        assert_eq!(aggregator.get("a"), Some(Outcome::Report(1)));
        assert_eq!(aggregator.get("b"), None);
    }

    #[test]
    fn test_duplicate_key_replaces() {
        let aggregator = ResultAggregator::new();
        aggregator.set("a".to_string(), Outcome::Report(1));
        aggregator.set("a".to_string(), Outcome::<i32>::Failed("gone".to_string()));

        assert_eq!(aggregator.len(), 1);
        assert_eq!(
            aggregator.get("a"),
            Some(Outcome::Failed("gone".to_string()))
        );
    }

    #[test]
    fn test_take_drains_entries() {
        let aggregator = ResultAggregator::new();
        aggregator.set("a".to_string(), Outcome::Report(1));

        let map = aggregator.take();
        assert_eq!(map.len(), 1);
        assert!(aggregator.is_empty());
    }
}
