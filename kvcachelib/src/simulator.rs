use std::thread;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};
use crate::cache::{CacheTrait, GenericCache};
use crate::config::HierarchyConfig;
use crate::error::{CacheError, Result};
use crate::hierarchy::{CacheHierarchy, HierarchyStats};
use crate::stats::CacheStats;
use crate::workload::{Key, Operation, OperationKind, Payload};

/// What a simulation runs against
pub enum SimulationTarget {
    Cache(GenericCache<Key, Payload>),
    Hierarchy(CacheHierarchy<Key, Payload>),
}

impl From<GenericCache<Key, Payload>> for SimulationTarget {
    fn from(value: GenericCache<Key, Payload>) -> Self {
        Self::Cache(value)
    }
}

impl From<CacheHierarchy<Key, Payload>> for SimulationTarget {
    fn from(value: CacheHierarchy<Key, Payload>) -> Self {
        Self::Hierarchy(value)
    }
}

/// The result of a simulation. Can be serialised for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub operations: u64,
    pub reads: u64,
    pub writes: u64,
    pub hits: u64,
    pub misses: u64,
    /// Summed over every level for a hierarchy
    pub evictions: u64,
    pub hit_rate: f64,
    /// Always 0 for a single cache, which has no notion of latency
    pub avg_latency_ms: f64,
    pub levels: Vec<LevelUtilization>,
    /// Full statistics, only present when simulating a hierarchy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<HierarchyStats>,
}

/// How full a level (or the lone cache) ended up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelUtilization {
    pub name: String,
    pub current_size: usize,
    pub capacity: usize,
    pub utilization: f64,
}

impl LevelUtilization {
    fn from_stats(name: impl Into<String>, stats: &CacheStats) -> Self {
        Self {
            name: name.into(),
            current_size: stats.current_size,
            capacity: stats.capacity,
            utilization: stats.utilization,
        }
    }
}

/// The simulator applies operations in order to its target, and collects results.
///
/// It supports calling simulate multiple times. Statistics accumulate across calls, as does the
/// time taken to simulate
pub struct Simulator {
    target: SimulationTarget,
    reads: u64,
    writes: u64,
    simulation_time: Duration,
}

impl Simulator {
    /// Creates a new simulator which owns its target for as long as it lives
    ///
    /// Fails if the target is a hierarchy without any levels
    pub fn new(target: impl Into<SimulationTarget>) -> Result<Self> {
        let target = target.into();
        if let SimulationTarget::Hierarchy(hierarchy) = &target {
            if hierarchy.num_levels() == 0 {
                return Err(CacheError::config(format!(
                    "hierarchy '{}' has no levels to simulate",
                    hierarchy.name()
                )));
            }
        }
        Ok(Self {
            target,
            reads: 0,
            writes: 0,
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Applies every operation, strictly in order
    ///
    /// Every operation is checked before any is applied, so a malformed one fails the call and
    /// leaves the target and the counters exactly as they were
    ///
    /// # Arguments
    ///
    /// * `operations`: The operations, usually from a workload generator
    ///
    /// returns: Result<MetricsReport, CacheError>
    pub fn simulate(&mut self, operations: &[Operation]) -> Result<MetricsReport> {
        info!(operations = operations.len(), "starting simulation");
        operations
            .iter()
            .enumerate()
            .try_for_each(|(index, operation)| check(index, operation))?;
        let start = Instant::now();
        for (index, operation) in operations.iter().enumerate() {
            self.apply(index, operation);
        }
        self.simulation_time += start.elapsed();
        let report = self.report();
        info!(hits = report.hits, misses = report.misses, hit_rate = report.hit_rate, "simulation finished");
        Ok(report)
    }

    /// Applies a checked operation, for which a value is present exactly when it is a write
    fn apply(&mut self, index: usize, operation: &Operation) {
        trace!(index, kind = ?operation.kind, key = operation.key, "applying");
        match &operation.value {
            None => {
                self.reads += 1;
                match &mut self.target {
                    SimulationTarget::Cache(cache) => {
                        cache.get(&operation.key);
                    }
                    SimulationTarget::Hierarchy(hierarchy) => {
                        hierarchy.read(&operation.key);
                    }
                }
            }
            Some(value) => {
                self.writes += 1;
                match &mut self.target {
                    SimulationTarget::Cache(cache) => {
                        cache.put(operation.key, value.clone());
                    }
                    SimulationTarget::Hierarchy(hierarchy) => {
                        hierarchy.write(operation.key, value.clone());
                    }
                }
            }
        }
    }

    /// Builds a report from the target's current statistics
    pub fn report(&self) -> MetricsReport {
        let operations = self.reads + self.writes;
        match &self.target {
            SimulationTarget::Cache(cache) => {
                let stats = cache.stats();
                MetricsReport {
                    operations,
                    reads: self.reads,
                    writes: self.writes,
                    hits: stats.hits,
                    misses: stats.misses,
                    evictions: stats.evictions,
                    hit_rate: stats.hit_rate,
                    avg_latency_ms: 0.0,
                    levels: vec![LevelUtilization::from_stats(cache.policy_kind().to_string(), &stats)],
                    hierarchy: None,
                }
            }
            SimulationTarget::Hierarchy(hierarchy) => {
                let stats = hierarchy.get_all_stats();
                MetricsReport {
                    operations,
                    reads: self.reads,
                    writes: self.writes,
                    hits: stats.global.hits,
                    misses: stats.global.misses,
                    evictions: stats.levels.iter().map(|level| level.cache.evictions).sum(),
                    hit_rate: stats.global.hit_rate,
                    avg_latency_ms: stats.global.avg_latency_ms,
                    levels: stats.levels
                        .iter()
                        .map(|level| LevelUtilization::from_stats(level.name.clone(), &level.cache))
                        .collect(),
                    hierarchy: Some(stats),
                }
            }
        }
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    pub fn target(&self) -> &SimulationTarget {
        &self.target
    }

    pub fn into_target(self) -> SimulationTarget {
        self.target
    }
}

/// Reads carry no value and writes always carry one
fn check(index: usize, operation: &Operation) -> Result<()> {
    match (operation.kind, &operation.value) {
        (OperationKind::Read, None) | (OperationKind::Write, Some(_)) => Ok(()),
        (OperationKind::Read, Some(_)) => Err(CacheError::operation(format!(
            "operation {index} reads key {} but carries a value",
            operation.key
        ))),
        (OperationKind::Write, None) => Err(CacheError::operation(format!(
            "operation {index} writes key {} without a value",
            operation.key
        ))),
    }
}

/// Runs a workload against a target, returning the metrics
///
/// # Examples
///
/// ```
/// use kvcachelib::cache::{new_cache, GenericCache};
/// use kvcachelib::replacement_policies::PolicyKind;
/// use kvcachelib::simulator::run;
/// use kvcachelib::workload::{Key, Operation, Payload};
/// let cache: GenericCache<Key, Payload> = new_cache(PolicyKind::LeastRecentlyUsed, 2).unwrap();
/// let operations = vec![Operation::write(1, "a"), Operation::read(1), Operation::read(2)];
/// let report = run(&operations, cache).unwrap();
/// assert_eq!((report.hits, report.misses), (1, 1));
/// ```
pub fn run(operations: &[Operation], target: impl Into<SimulationTarget>) -> Result<MetricsReport> {
    Simulator::new(target)?.simulate(operations)
}

/// The outcome of one configuration in a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub name: String,
    pub report: MetricsReport,
}

/// Runs the same operations against several hierarchies in parallel
///
/// Each run builds and owns its hierarchy on its own thread; only the operations are shared, and
/// only for reading. Results come back in the order of `configs`. Any configuration or operation
/// error fails the whole comparison
pub fn compare(configs: &[HierarchyConfig], operations: &[Operation]) -> Result<Vec<ComparisonResult>> {
    thread::scope(|scope| {
        let handles: Vec<_> = configs
            .iter()
            .map(|config| {
                scope.spawn(move || -> Result<ComparisonResult> {
                    let hierarchy = config.build()?;
                    let report = run(operations, hierarchy)?;
                    Ok(ComparisonResult {
                        name: config.name.clone(),
                        report,
                    })
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| CacheError::operation("a comparison run panicked"))?
            })
            .collect()
    })
}
