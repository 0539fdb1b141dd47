use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::cache::{CacheKey, CacheTrait, GenericCache};
use crate::error::{CacheError, Result};
use crate::replacement_policies::PolicyKind;
use crate::stats::{self, CacheStats};

/// Counters the hierarchy keeps for each of its levels, on top of the level cache's own stats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelStats {
    /// Reads served by this level
    pub hits: u64,
    /// Reads which probed this level and moved on
    pub misses: u64,
    /// Values copied into this level from a lower one
    pub promotions: u64,
    /// Latency charged for probing this level
    pub total_latency_ms: f64,
}

impl LevelStats {
    pub fn hit_rate(&self) -> f64 {
        stats::hit_rate(self.hits, self.misses)
    }

    /// Average latency per probe of this level
    pub fn avg_latency_ms(&self) -> f64 {
        let probes = self.hits + self.misses;
        if probes == 0 {
            0.0
        } else {
            self.total_latency_ms / probes as f64
        }
    }
}

/// A single named level. Levels are only created through [CacheHierarchy::add_level]
pub struct CacheLevel<K, V> {
    name: String,
    cache: GenericCache<K, V>,
    latency_ms: f64,
    stats: LevelStats,
}

impl<K: CacheKey, V: Clone> CacheLevel<K, V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    pub fn cache(&self) -> &GenericCache<K, V> {
        &self.cache
    }

    pub fn stats(&self) -> &LevelStats {
        &self.stats
    }

    fn report(&self) -> LevelReport {
        LevelReport {
            name: self.name.clone(),
            policy: self.cache.policy_kind(),
            latency_ms: self.latency_ms,
            hit_rate: self.stats.hit_rate(),
            avg_latency_ms: self.stats.avg_latency_ms(),
            level: self.stats.clone(),
            cache: self.cache.stats(),
        }
    }
}

/// Hierarchy-wide statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub reads: u64,
    pub writes: u64,
    pub hits: u64,
    pub misses: u64,
    /// hits / reads
    pub hit_rate: f64,
    pub promotions: u64,
    pub total_latency_ms: f64,
    /// Total latency over all reads and writes
    pub avg_latency_ms: f64,
    pub num_levels: usize,
    pub total_capacity: usize,
    pub total_size: usize,
}

/// Statistics for one level, combining the hierarchy's view with the level cache's own counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelReport {
    pub name: String,
    pub policy: PolicyKind,
    pub latency_ms: f64,
    pub hit_rate: f64,
    pub avg_latency_ms: f64,
    pub level: LevelStats,
    pub cache: CacheStats,
}

/// Snapshot returned by [CacheHierarchy::get_all_stats]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyStats {
    pub name: String,
    pub global: GlobalStats,
    pub levels: Vec<LevelReport>,
}

/// An ordered chain of caches, L1 first
///
/// Reads probe each level in turn and promote hits into every faster level. Writes go through to
/// every level. Levels evict independently and evicted values are never pushed down, so the
/// hierarchy is non-inclusive
///
/// Latency is accounted, not waited for. The topology is frozen by the first read or write and
/// stays that way until [CacheHierarchy::clear]
pub struct CacheHierarchy<K, V> {
    name: String,
    levels: Vec<CacheLevel<K, V>>,
    reads: u64,
    writes: u64,
    hits: u64,
    misses: u64,
    promotions: u64,
    total_latency_ms: f64,
    frozen: bool,
}

impl<K: CacheKey, V: Clone> CacheHierarchy<K, V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            levels: Vec::new(),
            reads: 0,
            writes: 0,
            hits: 0,
            misses: 0,
            promotions: 0,
            total_latency_ms: 0.0,
            frozen: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a level below the existing ones
    ///
    /// # Arguments
    ///
    /// * `cache`: The cache for the level, owned by the hierarchy from now on
    /// * `name`: Unique within the hierarchy
    /// * `latency_ms`: The cost of probing the level, finite and non-negative
    ///
    /// returns: Result<(), CacheError>
    pub fn add_level(&mut self, cache: GenericCache<K, V>, name: impl Into<String>, latency_ms: f64) -> Result<()> {
        let name = name.into();
        if self.frozen {
            return Err(CacheError::config(format!(
                "can't add level '{name}', the topology of '{}' is frozen once it has been accessed",
                self.name
            )));
        }
        if !latency_ms.is_finite() || latency_ms < 0.0 {
            return Err(CacheError::config(format!(
                "latency of level '{name}' must be a non-negative number, got {latency_ms}"
            )));
        }
        if self.levels.iter().any(|level| level.name == name) {
            return Err(CacheError::config(format!("a level named '{name}' already exists")));
        }
        debug!(hierarchy = %self.name, level = %name, latency_ms, capacity = cache.capacity(), "added level");
        self.levels.push(CacheLevel {
            name,
            cache,
            latency_ms,
            stats: LevelStats::default(),
        });
        Ok(())
    }

    /// Reads a key, probing L1 first
    ///
    /// On a hit at level i the value is promoted into levels 1..i, and the latency charged is that
    /// of every level probed. A miss is charged for the whole chain
    ///
    /// returns: Option<V>, None on a global miss
    pub fn read(&mut self, key: &K) -> Option<V> {
        self.frozen = true;
        self.reads += 1;
        let mut latency = 0.0;
        let mut found = None;
        for (index, level) in self.levels.iter_mut().enumerate() {
            latency += level.latency_ms;
            level.stats.total_latency_ms += level.latency_ms;
            if level.cache.contains(key) {
                level.stats.hits += 1;
                found = level.cache.get(key).map(|value| (index, value));
                break;
            }
            level.stats.misses += 1;
        }
        self.total_latency_ms += latency;
        match found {
            Some((index, value)) => {
                self.hits += 1;
                self.promote(key, &value, index);
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Writes through to every level, L1 first. Neither a hit nor a miss
    pub fn write(&mut self, key: K, value: V) {
        self.frozen = true;
        self.writes += 1;
        for level in &mut self.levels {
            level.cache.put(key.clone(), value.clone());
        }
        self.total_latency_ms += self.full_latency_ms();
    }

    /// Copies a value into every level above `from_level`
    fn promote(&mut self, key: &K, value: &V, from_level: usize) {
        for level in &mut self.levels[..from_level] {
            let evicted = level.cache.put(key.clone(), value.clone());
            level.stats.promotions += 1;
            self.promotions += 1;
            debug!(level = %level.name, ?key, ?evicted, "promoted");
        }
    }

    /// Whether any level holds the key. Doesn't count as an access
    pub fn contains(&self, key: &K) -> bool {
        self.levels.iter().any(|level| level.cache.contains(key))
    }

    /// Removes a key from every level, returning whether any level held it
    pub fn remove(&mut self, key: &K) -> bool {
        let mut removed = false;
        for level in &mut self.levels {
            removed |= level.cache.remove(key).is_some();
        }
        removed
    }

    /// Empties every level and resets all statistics, which also unfreezes the topology
    pub fn clear(&mut self) {
        for level in &mut self.levels {
            level.cache.clear();
        }
        self.reset_stats();
        self.frozen = false;
    }

    /// Zeroes the hierarchy's counters and those of every level cache
    pub fn reset_stats(&mut self) {
        for level in &mut self.levels {
            level.stats = LevelStats::default();
            level.cache.reset_stats();
        }
        self.reads = 0;
        self.writes = 0;
        self.hits = 0;
        self.misses = 0;
        self.promotions = 0;
        self.total_latency_ms = 0.0;
    }

    pub fn level(&self, name: &str) -> Option<&CacheLevel<K, V>> {
        self.levels.iter().find(|level| level.name == name)
    }

    pub fn levels(&self) -> &[CacheLevel<K, V>] {
        &self.levels
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Saturates at usize::MAX
    pub fn total_capacity(&self) -> usize {
        self.levels.iter().map(|level| level.cache.capacity()).fold(0, usize::saturating_add)
    }

    pub fn total_size(&self) -> usize {
        self.levels.iter().map(|level| level.cache.len()).sum()
    }

    /// The cost of traversing every level
    pub fn full_latency_ms(&self) -> f64 {
        self.levels.iter().map(|level| level.latency_ms).sum()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Takes a snapshot of the global statistics and those of every level
    pub fn get_all_stats(&self) -> HierarchyStats {
        let operations = self.reads + self.writes;
        HierarchyStats {
            name: self.name.clone(),
            global: GlobalStats {
                reads: self.reads,
                writes: self.writes,
                hits: self.hits,
                misses: self.misses,
                hit_rate: if self.reads == 0 {
                    0.0
                } else {
                    self.hits as f64 / self.reads as f64
                },
                promotions: self.promotions,
                total_latency_ms: self.total_latency_ms,
                avg_latency_ms: if operations == 0 {
                    0.0
                } else {
                    self.total_latency_ms / operations as f64
                },
                num_levels: self.num_levels(),
                total_capacity: self.total_capacity(),
                total_size: self.total_size(),
            },
            levels: self.levels.iter().map(CacheLevel::report).collect(),
        }
    }
}
