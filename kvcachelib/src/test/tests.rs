use std::error::Error;
use crate::arena::{NodeArena, NodeList};
use crate::cache::{new_cache, Cache, CacheTrait, GenericCache};
use crate::error::CacheError;
use crate::replacement_policies::{FirstInFirstOut, LeastFrequentlyUsed, LeastRecentlyUsed, PolicyKind};
use crate::workload::{generate, Distribution, OperationKind, WorkloadConfig};

type Key = &'static str;

fn fifo(capacity: usize) -> Result<Cache<Key, i32, FirstInFirstOut<Key>>, CacheError> {
    Cache::new(capacity, FirstInFirstOut::new(capacity))
}

fn lru(capacity: usize) -> Result<Cache<Key, i32, LeastRecentlyUsed<Key>>, CacheError> {
    Cache::new(capacity, LeastRecentlyUsed::new(capacity))
}

fn lfu(capacity: usize) -> Result<Cache<Key, i32, LeastFrequentlyUsed<Key>>, CacheError> {
    Cache::new(capacity, LeastFrequentlyUsed::new(capacity))
}

const ALL_POLICIES: [PolicyKind; 3] = [
    PolicyKind::FirstInFirstOut,
    PolicyKind::LeastRecentlyUsed,
    PolicyKind::LeastFrequentlyUsed,
];

#[test]
fn fifo_evicts_oldest_insertion_regardless_of_reads() -> Result<(), Box<dyn Error>> {
    let mut cache = fifo(2)?;
    assert_eq!(cache.put("a", 1), None);
    assert_eq!(cache.put("b", 2), None);
    assert_eq!(cache.get(&"a"), Some(1));
    assert_eq!(cache.get(&"b"), Some(2));
    assert_eq!(cache.get(&"a"), Some(1));
    assert_eq!(cache.put("c", 3), Some("a"));
    assert!(!cache.contains(&"a"));
    assert!(cache.contains(&"b"));
    assert!(cache.contains(&"c"));
    Ok(())
}

#[test]
fn fifo_overwrite_keeps_insertion_position() -> Result<(), Box<dyn Error>> {
    let mut cache = fifo(2)?;
    cache.put("a", 1);
    cache.put("b", 2);
    assert_eq!(cache.put("a", 10), None);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.eviction_order(), vec![&"a", &"b"]);
    assert_eq!(cache.put("c", 3), Some("a"));
    assert_eq!(cache.put("d", 4), Some("b"));
    Ok(())
}

#[test]
fn lru_evicts_least_recently_read() -> Result<(), Box<dyn Error>> {
    let mut cache = lru(2)?;
    cache.put("a", 1);
    cache.put("b", 2);
    assert_eq!(cache.get(&"a"), Some(1));
    assert_eq!(cache.put("c", 3), Some("b"));
    assert!(cache.contains(&"a"));
    assert!(!cache.contains(&"b"));
    Ok(())
}

#[test]
fn lru_overwrite_refreshes_recency() -> Result<(), Box<dyn Error>> {
    let mut cache = lru(2)?;
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("a", 11);
    assert_eq!(cache.put("c", 3), Some("b"));
    assert_eq!(cache.get(&"a"), Some(11));
    Ok(())
}

#[test]
fn lru_order_tracks_every_touch() -> Result<(), Box<dyn Error>> {
    let mut cache = lru(4)?;
    for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
        cache.put(key, i as i32);
    }
    cache.get(&"b");
    cache.get(&"a");
    cache.put("c", 30);
    assert_eq!(cache.eviction_order(), vec![&"d", &"b", &"a", &"c"]);
    assert_eq!(cache.peek_victim(), Some(&"d"));
    Ok(())
}

#[test]
fn contains_has_no_side_effects() -> Result<(), Box<dyn Error>> {
    let mut cache = lru(2)?;
    cache.put("a", 1);
    cache.put("b", 2);
    assert!(cache.contains(&"a"));
    assert!(!cache.contains(&"z"));
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (0, 0));
    // Checking "a" didn't refresh it
    assert_eq!(cache.put("c", 3), Some("a"));
    Ok(())
}

#[test]
fn lfu_evicts_lowest_frequency() -> Result<(), Box<dyn Error>> {
    let mut cache = lfu(2)?;
    cache.put("a", 1);
    cache.put("b", 2);
    cache.get(&"a");
    assert_eq!(cache.frequency(&"a"), Some(2));
    assert_eq!(cache.frequency(&"b"), Some(1));
    assert_eq!(cache.put("c", 3), Some("b"));
    assert_eq!(cache.frequency(&"c"), Some(1));
    Ok(())
}

#[test]
fn lfu_breaks_ties_by_least_recent_touch() -> Result<(), Box<dyn Error>> {
    let mut cache = lfu(3)?;
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("c", 3);
    assert_eq!(cache.peek_victim(), Some(&"a"));
    // Everything reaches frequency 2, "c" first
    cache.get(&"c");
    cache.get(&"a");
    cache.get(&"b");
    assert_eq!(cache.frequency_distribution(), vec![(2, 3)]);
    assert_eq!(cache.peek_victim(), Some(&"c"));
    assert_eq!(cache.put("d", 4), Some("c"));
    // "d" is alone at frequency 1
    assert_eq!(cache.put("e", 5), Some("d"));
    assert_eq!(cache.eviction_order(), vec![&"e", &"a", &"b"]);
    Ok(())
}

#[test]
fn lfu_counts_insertion_reads_and_overwrites() -> Result<(), Box<dyn Error>> {
    let mut cache = lfu(3)?;
    cache.put("x", 1);
    assert_eq!(cache.frequency(&"x"), Some(1));
    for _ in 0..3 {
        cache.get(&"x");
    }
    assert_eq!(cache.frequency(&"x"), Some(4));
    cache.put("x", 2);
    assert_eq!(cache.frequency(&"x"), Some(5));
    // Misses don't create entries
    cache.get(&"y");
    assert_eq!(cache.frequency(&"y"), None);
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[test]
fn lfu_protects_popular_entries() -> Result<(), Box<dyn Error>> {
    let mut cache = lfu(3)?;
    cache.put("popular", 0);
    cache.put("temp1", 1);
    cache.put("temp2", 2);
    for _ in 0..20 {
        cache.get(&"popular");
    }
    assert_eq!(cache.frequency(&"popular"), Some(21));
    assert_eq!(cache.put("temp3", 3), Some("temp1"));
    assert_eq!(cache.put("temp4", 4), Some("temp2"));
    assert_eq!(cache.put("temp5", 5), Some("temp3"));
    assert!(cache.contains(&"popular"));
    assert_eq!(cache.frequency(&"popular"), Some(21));
    Ok(())
}

#[test]
fn lfu_remove_moves_minimum_frequency_up() -> Result<(), Box<dyn Error>> {
    let mut cache = lfu(3)?;
    cache.put("a", 1);
    cache.get(&"a");
    cache.put("b", 2);
    assert_eq!(cache.peek_victim(), Some(&"b"));
    assert_eq!(cache.remove(&"b"), Some(2));
    assert_eq!(cache.peek_victim(), Some(&"a"));
    cache.put("c", 3);
    assert_eq!(cache.peek_victim(), Some(&"c"));
    assert_eq!(cache.frequency_distribution(), vec![(1, 1), (2, 1)]);
    Ok(())
}

#[test]
fn zero_capacity_is_rejected() {
    for kind in ALL_POLICIES {
        let result = new_cache::<u64, u64>(kind, 0);
        assert!(matches!(result, Err(CacheError::InvalidConfiguration(_))), "{kind} accepted capacity 0");
    }
}

#[test]
fn huge_capacity_is_a_limit_not_an_allocation() -> Result<(), Box<dyn Error>> {
    for kind in ALL_POLICIES {
        let mut cache: GenericCache<u64, String> = new_cache(kind, usize::MAX / 64)?;
        for key in 0..100 {
            assert_eq!(cache.put(key, key.to_string()), None);
        }
        assert_eq!(cache.get(&42), Some(String::from("42")));
        assert_eq!(cache.len(), 100);
        assert!(!cache.is_full());
        assert_eq!(cache.stats().capacity, usize::MAX / 64);
    }
    Ok(())
}

#[test]
fn items_follow_eviction_order() -> Result<(), Box<dyn Error>> {
    let mut lru: GenericCache<Key, i32> = new_cache(PolicyKind::LeastRecentlyUsed, 3)?;
    lru.put("a", 1);
    lru.put("b", 2);
    lru.put("c", 3);
    lru.get(&"a");
    lru.put("b", 20);
    assert_eq!(lru.items(), vec![(&"c", &3), (&"a", &1), (&"b", &20)]);

    let mut lfu: GenericCache<Key, i32> = new_cache(PolicyKind::LeastFrequentlyUsed, 3)?;
    lfu.put("a", 1);
    lfu.put("b", 2);
    lfu.get(&"a");
    assert_eq!(lfu.items(), vec![(&"b", &2), (&"a", &1)]);

    let fifo: GenericCache<Key, i32> = new_cache(PolicyKind::FirstInFirstOut, 3)?;
    assert!(fifo.items().is_empty());
    Ok(())
}

#[test]
fn new_cache_selects_the_policy() -> Result<(), Box<dyn Error>> {
    for kind in ALL_POLICIES {
        let cache: GenericCache<u64, u64> = new_cache(kind, 4)?;
        assert_eq!(cache.policy_kind(), kind);
        assert_eq!(cache.capacity(), 4);
        assert!(cache.is_empty());
    }
    Ok(())
}

#[test]
fn stats_follow_gets_puts_and_evictions() -> Result<(), Box<dyn Error>> {
    let mut cache: GenericCache<Key, i32> = new_cache(PolicyKind::LeastRecentlyUsed, 2)?;
    let empty = cache.stats();
    assert_eq!((empty.hit_rate, empty.miss_rate, empty.utilization), (0.0, 0.0, 0.0));

    cache.put("a", 1);
    cache.get(&"a");
    cache.get(&"a");
    cache.get(&"a");
    cache.get(&"missing");
    cache.put("b", 2);
    cache.put("c", 3);

    let stats = cache.stats();
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.current_size, 2);
    assert_eq!(stats.capacity, 2);
    assert_eq!(stats.accesses(), 4);
    assert!((stats.hit_rate - 0.75).abs() < 1e-12);
    assert!((stats.hit_rate + stats.miss_rate - 1.0).abs() < 1e-12);
    assert!((stats.utilization - 1.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn remove_clear_and_reset_leave_counters_consistent() -> Result<(), Box<dyn Error>> {
    let mut cache: GenericCache<Key, i32> = new_cache(PolicyKind::FirstInFirstOut, 3)?;
    cache.put("a", 1);
    cache.put("b", 2);
    cache.get(&"a");
    assert_eq!(cache.remove(&"a"), Some(1));
    assert_eq!(cache.remove(&"a"), None);
    assert_eq!(cache.stats().current_size, 1);
    assert_eq!(cache.stats().evictions, 0);
    assert_eq!(cache.eviction_order(), vec![&"b"]);

    cache.reset_stats();
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.current_size), (0, 0, 1));

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().current_size, 0);
    assert_eq!(cache.peek_victim(), None);
    cache.put("c", 3);
    assert_eq!(cache.eviction_order(), vec![&"c"]);
    Ok(())
}

#[test]
fn frequency_is_only_tracked_by_lfu() -> Result<(), Box<dyn Error>> {
    let mut lru: GenericCache<Key, i32> = new_cache(PolicyKind::LeastRecentlyUsed, 2)?;
    let mut lfu: GenericCache<Key, i32> = new_cache(PolicyKind::LeastFrequentlyUsed, 2)?;
    lru.put("a", 1);
    lfu.put("a", 1);
    lfu.get(&"a");
    assert_eq!(lru.frequency(&"a"), None);
    assert_eq!(lfu.frequency(&"a"), Some(2));
    Ok(())
}

#[test]
fn size_matches_contains_after_any_sequence() -> Result<(), Box<dyn Error>> {
    let config = WorkloadConfig {
        num_keys: 40,
        num_operations: 3000,
        read_ratio: 0.5,
        seed: 11,
        distribution: Distribution::Uniform,
    };
    let operations = generate(&config)?;
    for kind in ALL_POLICIES {
        let mut cache: GenericCache<u64, String> = new_cache(kind, 7)?;
        for operation in &operations {
            match operation.kind {
                OperationKind::Read => {
                    cache.get(&operation.key);
                }
                OperationKind::Write => {
                    cache.put(operation.key, operation.value.clone().unwrap_or_default());
                }
            }
            let held = (0..config.num_keys).filter(|key| cache.contains(key)).count();
            assert!(cache.len() <= cache.capacity(), "{kind} overflowed");
            assert_eq!(cache.len(), held, "{kind} index and contains disagree");
            assert_eq!(cache.eviction_order().len(), held, "{kind} has orphaned ordering nodes");
            assert_eq!(cache.stats().current_size, held);
        }
    }
    Ok(())
}

#[test]
fn arena_recycles_slots_and_keeps_handles_stable() {
    let mut arena = NodeArena::with_capacity(4);
    let mut first = NodeList::default();
    let mut second = NodeList::default();
    let a = arena.push_back(&mut first, 'a');
    let b = arena.push_back(&mut first, 'b');
    let c = arena.push_back(&mut first, 'c');
    assert_eq!(arena.iter(&first).collect::<String>(), "abc");

    arena.move_to_back(&mut first, a);
    assert_eq!(arena.iter(&first).collect::<String>(), "bca");

    arena.unlink(&mut first, c);
    arena.link_back(&mut second, c);
    assert_eq!(arena.iter(&first).collect::<String>(), "ba");
    assert_eq!(arena.iter(&second).collect::<String>(), "c");
    assert_eq!(arena.get(c), Some(&'c'));

    assert_eq!(arena.remove(&mut first, b), Some('b'));
    assert_eq!(arena.get(b), None);
    assert_eq!(first.len(), 1);
    assert_eq!(first.front(), Some(a));
    assert_eq!(first.back(), Some(a));

    // The freed slot is reused
    let d = arena.push_back(&mut second, 'd');
    assert_eq!(d, b);
    assert_eq!(arena.len(), 3);
    assert_eq!(arena.pop_front(&mut second), Some('c'));
    assert_eq!(arena.iter(&second).collect::<String>(), "d");
}
