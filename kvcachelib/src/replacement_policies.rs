use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::arena::{NodeArena, NodeId, NodeList};

/// The replacement policies provided by the library
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    #[serde(alias = "fifo", alias = "FIFO")]
    FirstInFirstOut,
    #[default]
    #[serde(alias = "lru", alias = "LRU")]
    LeastRecentlyUsed,
    #[serde(alias = "lfu", alias = "LFU")]
    LeastFrequentlyUsed,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::FirstInFirstOut => "FIFO",
            PolicyKind::LeastRecentlyUsed => "LRU",
            PolicyKind::LeastFrequentlyUsed => "LFU",
        };
        f.write_str(name)
    }
}

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// The policy only tracks ordering metadata. The cache owns the values and keeps a handle to the
/// policy's node for each key, so every operation here is given the handle rather than searching
pub trait ReplacementPolicy<K> {
    /// The kind reported in statistics
    fn kind(&self) -> PolicyKind;

    /// Starts tracking a newly inserted key, returning the handle the cache should keep for it
    fn on_insert(&mut self, key: K) -> NodeId;

    /// Updates the policy when an entry is read
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    fn on_access(&mut self, _node: NodeId) {}

    /// Updates the policy when an existing entry is overwritten. Defaults to treating it as an
    /// access
    fn on_update(&mut self, node: NodeId) {
        self.on_access(node)
    }

    /// Chooses a victim, stops tracking it and returns its key so the cache can drop the value
    ///
    /// Returns None only when nothing is tracked
    fn evict(&mut self) -> Option<K>;

    /// Stops tracking an entry which the cache removed explicitly
    fn remove(&mut self, node: NodeId);

    fn clear(&mut self);

    /// The key [ReplacementPolicy::evict] would pick, without evicting it
    fn peek_victim(&self) -> Option<&K>;

    /// Every tracked key, the next victim first
    fn eviction_order(&self) -> Vec<&K>;
}

/// First in, first out
///
/// Keys are queued by their first insertion, reads and overwrites never move them
pub struct FirstInFirstOut<K> {
    arena: NodeArena<K>,
    queue: NodeList,
}

impl<K> FirstInFirstOut<K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: NodeArena::with_capacity(capacity),
            queue: NodeList::default(),
        }
    }
}

impl<K> ReplacementPolicy<K> for FirstInFirstOut<K> {
    fn kind(&self) -> PolicyKind {
        PolicyKind::FirstInFirstOut
    }

    fn on_insert(&mut self, key: K) -> NodeId {
        self.arena.push_back(&mut self.queue, key)
    }

    fn on_update(&mut self, _node: NodeId) {}

    fn evict(&mut self) -> Option<K> {
        self.arena.pop_front(&mut self.queue)
    }

    fn remove(&mut self, node: NodeId) {
        self.arena.remove(&mut self.queue, node);
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.queue = NodeList::default();
    }

    fn peek_victim(&self) -> Option<&K> {
        self.queue.front().and_then(|id| self.arena.get(id))
    }

    fn eviction_order(&self) -> Vec<&K> {
        self.arena.iter(&self.queue).collect()
    }
}

/// Least Recently Used replacement policy
///
/// Keeps a recency list, least recent at the front. Reads and writes both move the entry to the
/// back, which is a constant time splice as the cache hands us the node directly
pub struct LeastRecentlyUsed<K> {
    arena: NodeArena<K>,
    recency: NodeList,
}

impl<K> LeastRecentlyUsed<K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: NodeArena::with_capacity(capacity),
            recency: NodeList::default(),
        }
    }
}

impl<K> ReplacementPolicy<K> for LeastRecentlyUsed<K> {
    fn kind(&self) -> PolicyKind {
        PolicyKind::LeastRecentlyUsed
    }

    fn on_insert(&mut self, key: K) -> NodeId {
        self.arena.push_back(&mut self.recency, key)
    }

    fn on_access(&mut self, node: NodeId) {
        self.arena.move_to_back(&mut self.recency, node);
    }

    fn evict(&mut self) -> Option<K> {
        self.arena.pop_front(&mut self.recency)
    }

    fn remove(&mut self, node: NodeId) {
        self.arena.remove(&mut self.recency, node);
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.recency = NodeList::default();
    }

    fn peek_victim(&self) -> Option<&K> {
        self.recency.front().and_then(|id| self.arena.get(id))
    }

    fn eviction_order(&self) -> Vec<&K> {
        self.arena.iter(&self.recency).collect()
    }
}

#[derive(Debug)]
struct FrequencyNode<K> {
    key: K,
    frequency: u64,
}

/// Least frequently used replacement policy
///
/// Each frequency has its own recency list, and all of them share one arena. A touch moves the
/// node from the back of its bucket to the back of the next one, so within a bucket the front is
/// always the least recently touched entry, which is how ties are broken
///
/// `min_frequency` always names the lowest non-empty bucket while anything is tracked
pub struct LeastFrequentlyUsed<K> {
    arena: NodeArena<FrequencyNode<K>>,
    buckets: HashMap<u64, NodeList>,
    min_frequency: u64,
}

impl<K> LeastFrequentlyUsed<K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: NodeArena::with_capacity(capacity),
            buckets: HashMap::new(),
            min_frequency: 0,
        }
    }

    /// The access frequency of a tracked entry
    pub fn frequency(&self, node: NodeId) -> Option<u64> {
        self.arena.get(node).map(|n| n.frequency)
    }

    /// How many entries sit at each frequency
    pub fn frequency_distribution(&self) -> Vec<(u64, usize)> {
        let mut distribution: Vec<(u64, usize)> = self.buckets
            .iter()
            .map(|(frequency, bucket)| (*frequency, bucket.len()))
            .collect();
        distribution.sort_unstable();
        distribution
    }

    /// Unlinks a node from its bucket, dropping the bucket if that empties it.
    ///
    /// returns: whether the bucket was emptied
    fn detach(&mut self, node: NodeId, frequency: u64) -> bool {
        let Some(bucket) = self.buckets.get_mut(&frequency) else {
            return false;
        };
        self.arena.unlink(bucket, node);
        if bucket.is_empty() {
            self.buckets.remove(&frequency);
            true
        } else {
            false
        }
    }

    fn lowest_frequency(&self) -> u64 {
        self.buckets.keys().copied().min().unwrap_or(0)
    }
}

impl<K> ReplacementPolicy<K> for LeastFrequentlyUsed<K> {
    fn kind(&self) -> PolicyKind {
        PolicyKind::LeastFrequentlyUsed
    }

    fn on_insert(&mut self, key: K) -> NodeId {
        let bucket = self.buckets.entry(1).or_default();
        let node = self.arena.push_back(bucket, FrequencyNode { key, frequency: 1 });
        self.min_frequency = 1;
        node
    }

    fn on_access(&mut self, node: NodeId) {
        let Some(frequency) = self.frequency(node) else {
            return;
        };
        if self.detach(node, frequency) && self.min_frequency == frequency {
            // The node is about to land in the next bucket, so that one can't be empty
            self.min_frequency = frequency + 1;
        }
        if let Some(entry) = self.arena.get_mut(node) {
            entry.frequency = frequency + 1;
        }
        let bucket = self.buckets.entry(frequency + 1).or_default();
        self.arena.link_back(bucket, node);
    }

    fn evict(&mut self) -> Option<K> {
        let min_frequency = self.min_frequency;
        let bucket = self.buckets.get_mut(&min_frequency)?;
        let victim = self.arena.pop_front(bucket)?;
        if bucket.is_empty() {
            self.buckets.remove(&min_frequency);
            self.min_frequency = self.lowest_frequency();
        }
        Some(victim.key)
    }

    fn remove(&mut self, node: NodeId) {
        let Some(frequency) = self.frequency(node) else {
            return;
        };
        let emptied = self.detach(node, frequency);
        self.arena.release(node);
        if emptied && frequency == self.min_frequency {
            self.min_frequency = self.lowest_frequency();
        }
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.buckets.clear();
        self.min_frequency = 0;
    }

    fn peek_victim(&self) -> Option<&K> {
        self.buckets
            .get(&self.min_frequency)
            .and_then(|bucket| bucket.front())
            .and_then(|id| self.arena.get(id))
            .map(|n| &n.key)
    }

    fn eviction_order(&self) -> Vec<&K> {
        let mut frequencies: Vec<u64> = self.buckets.keys().copied().collect();
        frequencies.sort_unstable();
        frequencies
            .iter()
            .filter_map(|frequency| self.buckets.get(frequency))
            .flat_map(|bucket| self.arena.iter(bucket).map(|n| &n.key))
            .collect()
    }
}
