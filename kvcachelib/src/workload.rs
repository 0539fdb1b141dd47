use std::collections::HashSet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use crate::error::{CacheError, Result};

/// Keys produced by the generators, in `0..num_keys`
pub type Key = u64;

/// Synthetic payloads written by the generators. Only their presence matters to the caches
pub type Payload = String;

/// The kind of an operation
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    #[serde(alias = "get")]
    Read,
    #[serde(alias = "put")]
    Write,
}

/// A single access in a workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub key: Key,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Payload>,
}

impl Operation {
    pub fn read(key: Key) -> Self {
        Self {
            kind: OperationKind::Read,
            key,
            value: None,
        }
    }

    pub fn write(key: Key, value: impl Into<Payload>) -> Self {
        Self {
            kind: OperationKind::Write,
            key,
            value: Some(value.into()),
        }
    }
}

/// How keys are picked
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Distribution {
    /// Every key equally likely
    Uniform,
    /// Rank k (key k - 1) drawn with probability proportional to 1 / k^theta
    Zipfian {
        #[serde(default = "default_theta")]
        theta: f64,
    },
    /// Keys 0, 1, ..., num_keys - 1, then round again
    Sequential,
}

fn default_theta() -> f64 {
    0.99
}

impl Default for Distribution {
    fn default() -> Self {
        Distribution::Zipfian { theta: default_theta() }
    }
}

/// Configuration for a workload. Generation is a pure function of this
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub num_keys: u64,
    pub num_operations: usize,
    #[serde(default = "default_read_ratio")]
    pub read_ratio: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub distribution: Distribution,
}

fn default_read_ratio() -> f64 {
    0.8
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            num_keys: 100,
            num_operations: 1000,
            read_ratio: default_read_ratio(),
            seed: 0,
            distribution: Distribution::default(),
        }
    }
}

impl WorkloadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_keys == 0 {
            return Err(CacheError::config("num_keys must be at least 1"));
        }
        if self.num_operations == 0 {
            return Err(CacheError::config("num_operations must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.read_ratio) {
            return Err(CacheError::config(format!(
                "read_ratio must be between 0 and 1, got {}",
                self.read_ratio
            )));
        }
        if let Distribution::Zipfian { theta } = self.distribution {
            if !theta.is_finite() || theta < 0.0 {
                return Err(CacheError::config(format!(
                    "theta must be a non-negative number, got {theta}"
                )));
            }
        }
        Ok(())
    }
}

/// Picks the key for each operation
trait KeySampler {
    /// # Arguments
    ///
    /// * `index`: Position of the operation in the sequence
    /// * `rng`: The workload's random number generator
    fn next_key(&self, index: usize, rng: &mut ChaCha8Rng) -> Key;
}

struct UniformKeys {
    num_keys: u64,
}

impl KeySampler for UniformKeys {
    fn next_key(&self, _index: usize, rng: &mut ChaCha8Rng) -> Key {
        rng.gen_range(0..self.num_keys)
    }
}

/// Zipfian sampling by inverting the cumulative distribution
///
/// The CDF is built once, so each draw is a uniform number and a binary search
struct ZipfianKeys {
    cdf: Vec<f64>,
}

impl ZipfianKeys {
    fn new(num_keys: u64, theta: f64) -> Self {
        let normaliser = generalized_harmonic(num_keys, theta);
        let mut cumulative = 0.0;
        let mut cdf: Vec<f64> = (1..=num_keys)
            .map(|rank| {
                cumulative += (rank as f64).powf(-theta) / normaliser;
                cumulative
            })
            .collect();
        // Rounding can leave the last entry just short of 1, which would make the top of the
        // uniform range unreachable
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        Self { cdf }
    }
}

impl KeySampler for ZipfianKeys {
    fn next_key(&self, _index: usize, rng: &mut ChaCha8Rng) -> Key {
        let u: f64 = rng.gen();
        let rank = self.cdf.partition_point(|&c| c <= u);
        rank.min(self.cdf.len() - 1) as Key
    }
}

struct SequentialKeys {
    num_keys: u64,
}

impl KeySampler for SequentialKeys {
    fn next_key(&self, index: usize, _rng: &mut ChaCha8Rng) -> Key {
        index as u64 % self.num_keys
    }
}

/// H(n, theta), the sum of 1 / i^theta for i in 1..=n
pub fn generalized_harmonic(n: u64, theta: f64) -> f64 {
    (1..=n).map(|i| (i as f64).powf(-theta)).sum()
}

/// Probability of drawing the key of a given rank (1 based) under a Zipfian law
pub fn zipfian_probability(rank: u64, num_keys: u64, theta: f64) -> f64 {
    (rank as f64).powf(-theta) / generalized_harmonic(num_keys, theta)
}

/// A validated workload, ready to generate
///
/// Every call to [Workload::generate] starts from a fresh generator seeded from the config, so
/// replaying gives exactly the same sequence
pub struct Workload {
    config: WorkloadConfig,
    sampler: Box<dyn KeySampler + Send + Sync>,
}

impl Workload {
    pub fn new(config: WorkloadConfig) -> Result<Self> {
        config.validate()?;
        let sampler: Box<dyn KeySampler + Send + Sync> = match config.distribution {
            Distribution::Uniform => Box::new(UniformKeys { num_keys: config.num_keys }),
            Distribution::Zipfian { theta } => Box::new(ZipfianKeys::new(config.num_keys, theta)),
            Distribution::Sequential => Box::new(SequentialKeys { num_keys: config.num_keys }),
        };
        Ok(Self { config, sampler })
    }

    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Generates the full operation sequence
    pub fn generate(&self) -> Vec<Operation> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        (0..self.config.num_operations)
            .map(|index| {
                let key = self.sampler.next_key(index, &mut rng);
                if rng.gen_bool(self.config.read_ratio) {
                    Operation::read(key)
                } else {
                    let tag: u16 = rng.gen_range(0..10_000);
                    Operation::write(key, format!("value_for_{key}_{tag}"))
                }
            })
            .collect()
    }
}

/// Validates a configuration and generates its operations
///
/// # Examples
///
/// ```
/// use kvcachelib::workload::{generate, Distribution, WorkloadConfig};
/// let config = WorkloadConfig {
///     num_keys: 4,
///     num_operations: 8,
///     distribution: Distribution::Sequential,
///     ..WorkloadConfig::default()
/// };
/// let keys: Vec<u64> = generate(&config).unwrap().iter().map(|op| op.key).collect();
/// assert_eq!(keys, vec![0, 1, 2, 3, 0, 1, 2, 3]);
/// ```
pub fn generate(config: &WorkloadConfig) -> Result<Vec<Operation>> {
    Ok(Workload::new(config.clone())?.generate())
}

/// Summary of a generated sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadStats {
    pub total_operations: usize,
    pub reads: usize,
    pub writes: usize,
    pub unique_keys: usize,
    pub read_ratio: f64,
}

impl WorkloadStats {
    pub fn from_operations(operations: &[Operation]) -> Self {
        let reads = operations.iter().filter(|op| op.kind == OperationKind::Read).count();
        let unique_keys = operations.iter().map(|op| op.key).collect::<HashSet<_>>().len();
        Self {
            total_operations: operations.len(),
            reads,
            writes: operations.len() - reads,
            unique_keys,
            read_ratio: if operations.is_empty() {
                0.0
            } else {
                reads as f64 / operations.len() as f64
            },
        }
    }
}
