//! Short-lived memoization of cell values.
//!
//! Entries are keyed by (row, logical column) and trusted only for the
//! staleness window. A miss is never wrong, it only costs a data source read.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::value::Value;

/// Default staleness window.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(10);

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Cell values fetched from the data source, stamped with their fetch time.
#[derive(Debug)]
pub struct CellValueCache {
    entries: HashMap<(usize, usize), (Value, Instant)>,
    staleness: Duration,
    stats: CacheStats,
}

impl Default for CellValueCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS)
    }
}

impl CellValueCache {
    /// Create a cache with the given staleness window.
    pub fn new(staleness: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            staleness,
            stats: CacheStats::default(),
        }
    }

    /// The staleness window.
    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    /// Look up a value younger than the staleness window.
    pub fn get(&mut self, row: usize, col: usize) -> Option<Value> {
        self.get_at(row, col, Instant::now())
    }

    /// Look up a value as of `now`.
    pub fn get_at(&mut self, row: usize, col: usize, now: Instant) -> Option<Value> {
        let fresh = self
            .entries
            .get(&(row, col))
            .filter(|(_, stamp)| now.saturating_duration_since(*stamp) < self.staleness)
            .map(|(value, _)| value.clone());

        match fresh {
            Some(value) => {
                self.stats.hits += 1;
                tracing::trace!(target: "horizon_datagrid::cache", row, col, "cache hit");
                Some(value)
            }
            None => {
                self.stats.misses += 1;
                tracing::trace!(target: "horizon_datagrid::cache", row, col, "cache miss");
                None
            }
        }
    }

    /// Store a value fetched now.
    pub fn put(&mut self, row: usize, col: usize, value: Value) {
        self.put_at(row, col, value, Instant::now());
    }

    /// Store a value fetched at `now`.
    pub fn put_at(&mut self, row: usize, col: usize, value: Value, now: Instant) {
        self.entries.insert((row, col), (value, now));
    }

    /// Drop one entry.
    pub fn invalidate(&mut self, row: usize, col: usize) {
        self.entries.remove(&(row, col));
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::trace!(target: "horizon_datagrid::cache", entries = self.entries.len(), "cache cleared");
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_window() {
        let mut cache = CellValueCache::new(Duration::from_secs(10));
        let start = Instant::now();
        cache.put_at(1, 2, Value::Int(7), start);

        assert_eq!(
            cache.get_at(1, 2, start + Duration::from_secs(9)),
            Some(Value::Int(7))
        );
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_miss_after_window() {
        let mut cache = CellValueCache::new(Duration::from_secs(10));
        let start = Instant::now();
        cache.put_at(0, 0, Value::from("x"), start);

        assert_eq!(cache.get_at(0, 0, start + Duration::from_secs(10)), None);
        assert_eq!(cache.get_at(5, 5, start), None);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2 });
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = CellValueCache::default();
        cache.put(0, 0, Value::Int(1));
        cache.put(0, 1, Value::Int(2));

        cache.invalidate(0, 0);
        assert_eq!(cache.get(0, 0), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
