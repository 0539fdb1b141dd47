use serde::{Deserialize, Serialize};

/// Mutable counters owned by a single cache
///
/// Hits, misses and evictions only ever grow, unless explicitly reset. The current size is kept in
/// step with the cache's index by the cache itself
#[derive(Debug, Clone, Default)]
pub struct StatsRecorder {
    hits: u64,
    misses: u64,
    evictions: u64,
    current_size: usize,
}

impl StatsRecorder {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_current_size(&mut self, size: usize) {
        self.current_size = size;
    }

    /// Zeroes the counters. The size reflects what is held, so it is kept
    pub fn reset(&mut self) {
        *self = Self {
            current_size: self.current_size,
            ..Self::default()
        };
    }

    /// Takes an immutable snapshot, computing the derived ratios against `capacity`
    pub fn snapshot(&self, capacity: usize) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            current_size: self.current_size,
            capacity,
            hit_rate: hit_rate(self.hits, self.misses),
            miss_rate: miss_rate(self.hits, self.misses),
            utilization: if capacity == 0 {
                0.0
            } else {
                self.current_size as f64 / capacity as f64
            },
        }
    }
}

/// A read-only snapshot of a cache's statistics. Can be serialised for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub current_size: usize,
    pub capacity: usize,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub utilization: f64,
}

impl CacheStats {
    /// Total number of `get` calls recorded
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// hits / (hits + misses), or 0 when nothing has been read
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// The complement of [hit_rate], also 0 when nothing has been read
pub fn miss_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        misses as f64 / total as f64
    }
}
