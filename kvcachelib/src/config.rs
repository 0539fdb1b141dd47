use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::backend::{self, Backend};
use crate::cache::new_cache;
use crate::error::{CacheError, Result};
use crate::hierarchy::CacheHierarchy;
use crate::replacement_policies::PolicyKind;
use crate::workload::{Key, Payload, WorkloadConfig};

lazy_static! {
    /// `NAME:POLICY:CAPACITY@LATENCY`, e.g. `L1:lru:64@0.5`
    static ref LEVEL_SPEC: Regex = Regex::new(
        r"^(?P<name>[0-9A-Za-z_\-]+):(?P<policy>[A-Za-z]+):(?P<capacity>[0-9]+)@(?P<latency>[0-9]+(\.[0-9]+)?)$"
    ).expect("level spec pattern is valid");
}

/// A complete simulation: one workload, run against one or more hierarchies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub workload: WorkloadConfig,
    pub hierarchies: Vec<HierarchyConfig>,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        self.workload.validate()?;
        if self.hierarchies.is_empty() {
            return Err(CacheError::config("at least one hierarchy is required"));
        }
        self.hierarchies.iter().try_for_each(HierarchyConfig::validate)
    }
}

/// A hierarchy with multiple levels, L1 first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    #[serde(default = "default_hierarchy_name")]
    pub name: String,
    pub levels: Vec<LevelConfig>,
}

/// A configuration for a single level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    pub capacity: usize,
    #[serde(default, alias = "policy")]
    pub replacement_policy: PolicyKind,
    #[serde(default)]
    pub latency_ms: f64,
}

fn default_hierarchy_name() -> String {
    String::from("MultilevelCache")
}

impl LevelConfig {
    pub fn new(name: impl Into<String>, replacement_policy: PolicyKind, capacity: usize, latency_ms: f64) -> Self {
        Self {
            name: name.into(),
            capacity,
            replacement_policy,
            latency_ms,
        }
    }

    /// Parses the compact `NAME:POLICY:CAPACITY@LATENCY` form used on the command line
    ///
    /// The policy is one of fifo, lru or lfu, in any case
    ///
    /// # Examples
    ///
    /// ```
    /// use kvcachelib::config::LevelConfig;
    /// use kvcachelib::replacement_policies::PolicyKind;
    /// let level = LevelConfig::parse("L2:LFU:128@5.5").unwrap();
    /// assert_eq!(level, LevelConfig::new("L2", PolicyKind::LeastFrequentlyUsed, 128, 5.5));
    /// ```
    pub fn parse(spec: &str) -> Result<Self> {
        let tokens = LEVEL_SPEC.captures(spec.trim()).ok_or_else(|| {
            CacheError::config(format!("couldn't parse level '{spec}', expected NAME:POLICY:CAPACITY@LATENCY"))
        })?;
        let policy = match tokens["policy"].to_ascii_lowercase().as_str() {
            "fifo" => PolicyKind::FirstInFirstOut,
            "lru" => PolicyKind::LeastRecentlyUsed,
            "lfu" => PolicyKind::LeastFrequentlyUsed,
            other => return Err(CacheError::config(format!("unknown replacement policy '{other}'"))),
        };
        let capacity = tokens["capacity"]
            .parse()
            .map_err(|e| CacheError::config(format!("bad capacity in level '{spec}': {e}")))?;
        let latency_ms = tokens["latency"]
            .parse()
            .map_err(|e| CacheError::config(format!("bad latency in level '{spec}': {e}")))?;
        Ok(Self::new(&tokens["name"], policy, capacity, latency_ms))
    }
}

impl HierarchyConfig {
    pub fn new(name: impl Into<String>, levels: Vec<LevelConfig>) -> Self {
        Self {
            name: name.into(),
            levels,
        }
    }

    /// One level per backend, each named after its backend and charged its latency
    pub fn from_backends<'a>(
        name: impl Into<String>,
        levels: impl IntoIterator<Item = (&'a Backend, PolicyKind, usize)>,
    ) -> Self {
        Self::new(
            name,
            levels
                .into_iter()
                .map(|(backend, policy, capacity)| backend.level(policy, capacity))
                .collect(),
        )
    }

    /// The [backend::typical_backends] tiers, LRU above an LFU disk
    pub fn typical(capacities: [usize; 3]) -> Self {
        Self::tiered("TypicalHierarchy", &backend::typical_backends(), capacities)
    }

    /// The [backend::cloud_backends] tiers, LRU above LFU cloud storage
    pub fn cloud(capacities: [usize; 3]) -> Self {
        Self::tiered("CloudHierarchy", &backend::cloud_backends(), capacities)
    }

    fn tiered(name: &str, backends: &[Backend; 3], capacities: [usize; 3]) -> Self {
        let policies = [
            PolicyKind::LeastRecentlyUsed,
            PolicyKind::LeastRecentlyUsed,
            PolicyKind::LeastFrequentlyUsed,
        ];
        Self::from_backends(
            name,
            backends.iter().zip(policies).zip(capacities).map(|((backend, policy), capacity)| (backend, policy, capacity)),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(CacheError::config(format!("hierarchy '{}' has no levels", self.name)));
        }
        // Building is cheap, and catches everything add_level would
        self.build().map(|_| ())
    }

    /// Creates an empty hierarchy from this configuration
    pub fn build(&self) -> Result<CacheHierarchy<Key, Payload>> {
        let mut hierarchy = CacheHierarchy::new(self.name.clone());
        for level in &self.levels {
            let cache = new_cache(level.replacement_policy, level.capacity).map_err(|e| match e {
                CacheError::InvalidConfiguration(message) => {
                    CacheError::config(format!("level '{}': {message}", level.name))
                }
                other => other,
            })?;
            hierarchy.add_level(cache, level.name.clone(), level.latency_ms)?;
        }
        Ok(hierarchy)
    }
}

impl Default for HierarchyConfig {
    /// L1 LRU 10 @ 1ms, L2 LRU 100 @ 10ms, L3 LFU 1000 @ 50ms
    fn default() -> Self {
        Self::new(default_hierarchy_name(), vec![
            LevelConfig::new("L1", PolicyKind::LeastRecentlyUsed, 10, 1.0),
            LevelConfig::new("L2", PolicyKind::LeastRecentlyUsed, 100, 10.0),
            LevelConfig::new("L3", PolicyKind::LeastFrequentlyUsed, 1000, 50.0),
        ])
    }
}
