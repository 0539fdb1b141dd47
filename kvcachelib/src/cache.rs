use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;
use crate::arena::{NodeId, MAX_RESERVED};
use crate::error::{CacheError, Result};
use crate::replacement_policies::{FirstInFirstOut, LeastFrequentlyUsed, LeastRecentlyUsed, PolicyKind, ReplacementPolicy};
use crate::stats::{CacheStats, StatsRecorder};

/// Everything a key needs to be cached: hashing for the index, cloning so the replacement policy
/// can hold its own copy, and Debug for logging evictions
pub trait CacheKey: Hash + Eq + Clone + Debug {}

impl<T: Hash + Eq + Clone + Debug> CacheKey for T {}

/// A generic trait for caches
///
/// Both the generic [Cache] and the [GenericCache] enum implement this. The hierarchy and the
/// simulator only ever talk to caches through it
pub trait CacheTrait<K, V> {
    /// Looks up a key, returning a copy of the value on a hit
    ///
    /// Hits and misses are both counted, and a hit refreshes the replacement policy's metadata
    ///
    /// # Arguments
    ///
    /// * `key`: The key to look up
    ///
    /// returns: Option<V>, None on a miss
    fn get(&mut self, key: &K) -> Option<V>;

    /// Inserts or overwrites a value
    ///
    /// Overwriting keeps the size the same. Inserting into a full cache evicts exactly one entry,
    /// chosen by the replacement policy, first. Never changes the hit or miss counters
    ///
    /// # Arguments
    ///
    /// * `key`: The key to insert
    /// * `value`: The value to store
    ///
    /// returns: Option<K>, the evicted key if an eviction happened
    fn put(&mut self, key: K, value: V) -> Option<K>;

    /// Checks whether a key is held, without touching statistics or policy metadata
    fn contains(&self, key: &K) -> bool;

    /// Removes an entry outright. This is not an eviction, so no counters change
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Drops every entry. Counters are kept
    fn clear(&mut self);

    /// Takes a snapshot of the statistics
    fn stats(&self) -> CacheStats;

    /// Zeroes hits, misses and evictions
    fn reset_stats(&mut self);

    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    fn policy_kind(&self) -> PolicyKind;

    /// The key the next insertion into a full cache would evict
    fn peek_victim(&self) -> Option<&K>;

    /// All held keys, the next victim first
    fn eviction_order(&self) -> Vec<&K>;

    /// All held entries, in the same order as [CacheTrait::eviction_order]
    fn items(&self) -> Vec<(&K, &V)>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}

struct Slot<V> {
    value: V,
    node: NodeId,
}

/// A bounded key-value cache, parameterised by a replacement policy
///
/// The general approach here is to have one solid implementation which is easy to maintain and
/// expand with more replacement policies. The cache owns the index from keys to values, while the
/// policy only owns the ordering. Each index slot keeps the handle of its policy node, so the policy
/// never has to search for a key
///
/// Every key in the index has exactly one node in the policy, and vice versa
pub struct Cache<K, V, R: ReplacementPolicy<K>> {
    index: HashMap<K, Slot<V>>,
    replacement_policy: R,
    capacity: usize,
    stats: StatsRecorder,
}

impl<K: CacheKey, V: Clone, R: ReplacementPolicy<K>> Cache<K, V, R> {
    /// Creates an empty cache
    ///
    /// # Arguments
    ///
    /// * `capacity`: The maximum number of entries, must be positive
    /// * `policy`: The replacement policy
    ///
    /// returns: Result<Cache<K, V, R>, CacheError>
    pub fn new(capacity: usize, policy: R) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::config("cache capacity must be positive"));
        }
        Ok(Self {
            index: HashMap::with_capacity(capacity.min(MAX_RESERVED)),
            replacement_policy: policy,
            capacity,
            stats: StatsRecorder::default(),
        })
    }

    /// Read-only access to the replacement policy, for policy specific introspection
    pub fn policy(&self) -> &R {
        &self.replacement_policy
    }

    fn evict(&mut self) -> Option<K> {
        let victim = self.replacement_policy.evict()?;
        self.index.remove(&victim);
        self.stats.record_eviction();
        debug!(policy = %self.replacement_policy.kind(), ?victim, "evicted");
        Some(victim)
    }
}

impl<K: CacheKey, V: Clone> Cache<K, V, LeastFrequentlyUsed<K>> {
    /// The number of accesses recorded for a key, counting its insertion as the first
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.index
            .get(key)
            .and_then(|slot| self.replacement_policy.frequency(slot.node))
    }

    /// Number of entries at each access frequency, lowest frequency first
    pub fn frequency_distribution(&self) -> Vec<(u64, usize)> {
        self.replacement_policy.frequency_distribution()
    }
}

impl<K: CacheKey, V: Clone, R: ReplacementPolicy<K>> CacheTrait<K, V> for Cache<K, V, R> {
    fn get(&mut self, key: &K) -> Option<V> {
        match self.index.get(key) {
            Some(slot) => {
                let node = slot.node;
                let value = slot.value.clone();
                self.stats.record_hit();
                self.replacement_policy.on_access(node);
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn put(&mut self, key: K, value: V) -> Option<K> {
        if let Some(slot) = self.index.get_mut(&key) {
            slot.value = value;
            self.replacement_policy.on_update(slot.node);
            return None;
        }
        let evicted = if self.index.len() >= self.capacity {
            self.evict()
        } else {
            None
        };
        let node = self.replacement_policy.on_insert(key.clone());
        self.index.insert(key, Slot { value, node });
        self.stats.set_current_size(self.index.len());
        evicted
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.index.remove(key)?;
        self.replacement_policy.remove(slot.node);
        self.stats.set_current_size(self.index.len());
        Some(slot.value)
    }

    fn clear(&mut self) {
        self.index.clear();
        self.replacement_policy.clear();
        self.stats.set_current_size(0);
    }

    fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.capacity)
    }

    fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn policy_kind(&self) -> PolicyKind {
        self.replacement_policy.kind()
    }

    fn peek_victim(&self) -> Option<&K> {
        self.replacement_policy.peek_victim()
    }

    fn eviction_order(&self) -> Vec<&K> {
        self.replacement_policy.eviction_order()
    }

    fn items(&self) -> Vec<(&K, &V)> {
        self.replacement_policy
            .eviction_order()
            .into_iter()
            .filter_map(|key| self.index.get_key_value(key))
            .map(|(key, slot)| (key, &slot.value))
            .collect()
    }
}

/// Enum for the 3 types of cache provided by the library
///
/// Using trait objects reduces boilerplate, but it hides the concrete type from the compiler. It's
/// faster to explicitly branch on all implementations, as the compiler can reason about the
/// concrete types, perform function inlining etc
pub enum GenericCache<K, V> {
    FirstInFirstOut(Cache<K, V, FirstInFirstOut<K>>),
    LeastRecentlyUsed(Cache<K, V, LeastRecentlyUsed<K>>),
    LeastFrequentlyUsed(Cache<K, V, LeastFrequentlyUsed<K>>),
}

/// Creates an empty cache using the given replacement policy
///
/// # Arguments
///
/// * `kind`: The replacement policy
/// * `capacity`: The maximum number of entries, must be positive
///
/// returns: Result<GenericCache<K, V>, CacheError>
///
/// # Examples
///
/// ```
/// use kvcachelib::cache::{new_cache, CacheTrait};
/// use kvcachelib::replacement_policies::PolicyKind;
/// let mut cache = new_cache(PolicyKind::LeastRecentlyUsed, 2).unwrap();
/// cache.put("a", 1);
/// assert_eq!(cache.get(&"a"), Some(1));
/// ```
pub fn new_cache<K: CacheKey, V: Clone>(kind: PolicyKind, capacity: usize) -> Result<GenericCache<K, V>> {
    Ok(match kind {
        PolicyKind::FirstInFirstOut => {
            GenericCache::from(Cache::new(capacity, FirstInFirstOut::new(capacity))?)
        }
        PolicyKind::LeastRecentlyUsed => {
            GenericCache::from(Cache::new(capacity, LeastRecentlyUsed::new(capacity))?)
        }
        PolicyKind::LeastFrequentlyUsed => {
            GenericCache::from(Cache::new(capacity, LeastFrequentlyUsed::new(capacity))?)
        }
    })
}

impl<K: CacheKey, V: Clone> GenericCache<K, V> {
    /// The access frequency of a key. Only LFU caches track this, the others return None
    pub fn frequency(&self, key: &K) -> Option<u64> {
        match self {
            GenericCache::LeastFrequentlyUsed(c) => c.frequency(key),
            _ => None,
        }
    }
}

impl<K, V> From<Cache<K, V, FirstInFirstOut<K>>> for GenericCache<K, V> {
    fn from(value: Cache<K, V, FirstInFirstOut<K>>) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl<K, V> From<Cache<K, V, LeastRecentlyUsed<K>>> for GenericCache<K, V> {
    fn from(value: Cache<K, V, LeastRecentlyUsed<K>>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl<K, V> From<Cache<K, V, LeastFrequentlyUsed<K>>> for GenericCache<K, V> {
    fn from(value: Cache<K, V, LeastFrequentlyUsed<K>>) -> Self {
        Self::LeastFrequentlyUsed(value)
    }
}

impl<K: CacheKey, V: Clone> CacheTrait<K, V> for GenericCache<K, V> {
    fn get(&mut self, key: &K) -> Option<V> {
        match self {
            GenericCache::FirstInFirstOut(c) => c.get(key),
            GenericCache::LeastRecentlyUsed(c) => c.get(key),
            GenericCache::LeastFrequentlyUsed(c) => c.get(key)
        }
    }

    fn put(&mut self, key: K, value: V) -> Option<K> {
        match self {
            GenericCache::FirstInFirstOut(c) => c.put(key, value),
            GenericCache::LeastRecentlyUsed(c) => c.put(key, value),
            GenericCache::LeastFrequentlyUsed(c) => c.put(key, value)
        }
    }

    fn contains(&self, key: &K) -> bool {
        match self {
            GenericCache::FirstInFirstOut(c) => c.contains(key),
            GenericCache::LeastRecentlyUsed(c) => c.contains(key),
            GenericCache::LeastFrequentlyUsed(c) => c.contains(key)
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        match self {
            GenericCache::FirstInFirstOut(c) => c.remove(key),
            GenericCache::LeastRecentlyUsed(c) => c.remove(key),
            GenericCache::LeastFrequentlyUsed(c) => c.remove(key)
        }
    }

    fn clear(&mut self) {
        match self {
            GenericCache::FirstInFirstOut(c) => c.clear(),
            GenericCache::LeastRecentlyUsed(c) => c.clear(),
            GenericCache::LeastFrequentlyUsed(c) => c.clear()
        }
    }

    fn stats(&self) -> CacheStats {
        match self {
            GenericCache::FirstInFirstOut(c) => c.stats(),
            GenericCache::LeastRecentlyUsed(c) => c.stats(),
            GenericCache::LeastFrequentlyUsed(c) => c.stats()
        }
    }

    fn reset_stats(&mut self) {
        match self {
            GenericCache::FirstInFirstOut(c) => c.reset_stats(),
            GenericCache::LeastRecentlyUsed(c) => c.reset_stats(),
            GenericCache::LeastFrequentlyUsed(c) => c.reset_stats()
        }
    }

    fn len(&self) -> usize {
        match self {
            GenericCache::FirstInFirstOut(c) => c.len(),
            GenericCache::LeastRecentlyUsed(c) => c.len(),
            GenericCache::LeastFrequentlyUsed(c) => c.len()
        }
    }

    fn capacity(&self) -> usize {
        match self {
            GenericCache::FirstInFirstOut(c) => c.capacity(),
            GenericCache::LeastRecentlyUsed(c) => c.capacity(),
            GenericCache::LeastFrequentlyUsed(c) => c.capacity()
        }
    }

    fn policy_kind(&self) -> PolicyKind {
        match self {
            GenericCache::FirstInFirstOut(c) => c.policy_kind(),
            GenericCache::LeastRecentlyUsed(c) => c.policy_kind(),
            GenericCache::LeastFrequentlyUsed(c) => c.policy_kind()
        }
    }

    fn peek_victim(&self) -> Option<&K> {
        match self {
            GenericCache::FirstInFirstOut(c) => c.peek_victim(),
            GenericCache::LeastRecentlyUsed(c) => c.peek_victim(),
            GenericCache::LeastFrequentlyUsed(c) => c.peek_victim()
        }
    }

    fn eviction_order(&self) -> Vec<&K> {
        match self {
            GenericCache::FirstInFirstOut(c) => c.eviction_order(),
            GenericCache::LeastRecentlyUsed(c) => c.eviction_order(),
            GenericCache::LeastFrequentlyUsed(c) => c.eviction_order()
        }
    }

    fn items(&self) -> Vec<(&K, &V)> {
        match self {
            GenericCache::FirstInFirstOut(c) => c.items(),
            GenericCache::LeastRecentlyUsed(c) => c.items(),
            GenericCache::LeastFrequentlyUsed(c) => c.items()
        }
    }
}
