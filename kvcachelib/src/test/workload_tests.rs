use std::error::Error;
use crate::error::CacheError;
use crate::workload::{
    generalized_harmonic, generate, zipfian_probability, Distribution, Operation, OperationKind, Workload,
    WorkloadConfig, WorkloadStats,
};

fn config(distribution: Distribution, num_keys: u64, num_operations: usize) -> WorkloadConfig {
    WorkloadConfig {
        num_keys,
        num_operations,
        distribution,
        seed: 42,
        ..WorkloadConfig::default()
    }
}

fn key_counts(operations: &[Operation], num_keys: u64) -> Vec<usize> {
    let mut counts = vec![0; num_keys as usize];
    for operation in operations {
        counts[operation.key as usize] += 1;
    }
    counts
}

#[test]
fn same_seed_replays_exactly() -> Result<(), Box<dyn Error>> {
    for distribution in [Distribution::Uniform, Distribution::default(), Distribution::Sequential] {
        let workload = Workload::new(config(distribution, 50, 500))?;
        let first = workload.generate();
        assert_eq!(first, workload.generate());
        assert_eq!(first, generate(workload.config())?);
    }
    Ok(())
}

#[test]
fn different_seeds_differ() -> Result<(), Box<dyn Error>> {
    let a = generate(&config(Distribution::Uniform, 1000, 200))?;
    let b = generate(&WorkloadConfig {
        seed: 43,
        ..config(Distribution::Uniform, 1000, 200)
    })?;
    assert_ne!(a, b);
    Ok(())
}

#[test]
fn sequential_cycles_through_keys() -> Result<(), Box<dyn Error>> {
    let operations = generate(&config(Distribution::Sequential, 3, 7))?;
    let keys: Vec<u64> = operations.iter().map(|op| op.key).collect();
    assert_eq!(keys, vec![0, 1, 2, 0, 1, 2, 0]);
    Ok(())
}

#[test]
fn uniform_stays_in_range_and_covers_keys() -> Result<(), Box<dyn Error>> {
    let operations = generate(&config(Distribution::Uniform, 10, 10_000))?;
    let counts = key_counts(&operations, 10);
    // Expect ~1000 each
    assert!(counts.iter().all(|&count| (800..1200).contains(&count)), "{counts:?}");
    Ok(())
}

#[test]
fn zipfian_key_zero_matches_expected_frequency() -> Result<(), Box<dyn Error>> {
    let operations = generate(&config(Distribution::Zipfian { theta: 0.99 }, 100, 100_000))?;
    let counts = key_counts(&operations, 100);
    let expected = 1.0 / generalized_harmonic(100, 0.99);
    let observed = counts[0] as f64 / operations.len() as f64;
    assert!((observed - expected).abs() < 0.01, "observed {observed}, expected {expected}");
    // Popularity falls with rank
    assert!(counts[0] > counts[1] && counts[1] > counts[9] && counts[9] > counts[99]);
    Ok(())
}

#[test]
fn zipfian_with_zero_theta_is_uniform() -> Result<(), Box<dyn Error>> {
    assert!((zipfian_probability(1, 10, 0.0) - 0.1).abs() < 1e-12);
    assert!((zipfian_probability(10, 10, 0.0) - 0.1).abs() < 1e-12);
    let operations = generate(&config(Distribution::Zipfian { theta: 0.0 }, 10, 10_000))?;
    let counts = key_counts(&operations, 10);
    assert!(counts.iter().all(|&count| (800..1200).contains(&count)), "{counts:?}");
    Ok(())
}

#[test]
fn zipfian_probabilities_sum_to_one() {
    let total: f64 = (1..=250).map(|rank| zipfian_probability(rank, 250, 1.2)).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn read_ratio_is_respected() -> Result<(), Box<dyn Error>> {
    let reads_only = generate(&WorkloadConfig {
        read_ratio: 1.0,
        ..config(Distribution::Uniform, 20, 500)
    })?;
    assert!(reads_only.iter().all(|op| op.kind == OperationKind::Read && op.value.is_none()));

    let writes_only = generate(&WorkloadConfig {
        read_ratio: 0.0,
        ..config(Distribution::Uniform, 20, 500)
    })?;
    assert!(writes_only.iter().all(|op| op.kind == OperationKind::Write && op.value.is_some()));

    let mixed = generate(&config(Distribution::Uniform, 20, 20_000))?;
    let stats = WorkloadStats::from_operations(&mixed);
    assert!((stats.read_ratio - 0.8).abs() < 0.02, "{stats:?}");
    Ok(())
}

#[test]
fn written_values_name_their_key() -> Result<(), Box<dyn Error>> {
    let operations = generate(&WorkloadConfig {
        read_ratio: 0.0,
        ..config(Distribution::Sequential, 5, 10)
    })?;
    for operation in &operations {
        let value = operation.value.as_deref().ok_or("write without a value")?;
        assert!(value.starts_with(&format!("value_for_{}_", operation.key)), "{value}");
    }
    Ok(())
}

#[test]
fn invalid_configs_are_rejected() {
    let invalid = [
        WorkloadConfig { num_keys: 0, ..WorkloadConfig::default() },
        WorkloadConfig { num_operations: 0, ..WorkloadConfig::default() },
        WorkloadConfig { read_ratio: 1.5, ..WorkloadConfig::default() },
        WorkloadConfig { read_ratio: -0.1, ..WorkloadConfig::default() },
        WorkloadConfig { read_ratio: f64::NAN, ..WorkloadConfig::default() },
        WorkloadConfig { distribution: Distribution::Zipfian { theta: -1.0 }, ..WorkloadConfig::default() },
        WorkloadConfig { distribution: Distribution::Zipfian { theta: f64::INFINITY }, ..WorkloadConfig::default() },
    ];
    for config in invalid {
        assert!(
            matches!(Workload::new(config.clone()), Err(CacheError::InvalidConfiguration(_))),
            "{config:?} was accepted"
        );
    }
    assert!(WorkloadConfig::default().validate().is_ok());
}

#[test]
fn workload_stats_summarise_operations() {
    let operations = vec![
        Operation::write(1, "a"),
        Operation::read(1),
        Operation::read(2),
        Operation::read(1),
    ];
    let stats = WorkloadStats::from_operations(&operations);
    assert_eq!(stats.total_operations, 4);
    assert_eq!((stats.reads, stats.writes), (3, 1));
    assert_eq!(stats.unique_keys, 2);
    assert_eq!(stats.read_ratio, 0.75);
    assert_eq!(WorkloadStats::from_operations(&[]).read_ratio, 0.0);
}

#[test]
fn operations_deserialise_with_aliases() -> Result<(), Box<dyn Error>> {
    let operations: Vec<Operation> = serde_json::from_str(
        r#"[{"kind": "write", "key": 3, "value": "x"}, {"kind": "get", "key": 3}, {"kind": "put", "key": 4, "value": "y"}]"#,
    )?;
    assert_eq!(operations, vec![Operation::write(3, "x"), Operation::read(3), Operation::write(4, "y")]);
    assert_eq!(serde_json::to_string(&Operation::read(3))?, r#"{"kind":"read","key":3}"#);
    assert!(serde_json::from_str::<Operation>(r#"{"kind": "delete", "key": 3}"#).is_err());
    Ok(())
}

#[test]
fn workload_config_deserialises_with_defaults() -> Result<(), Box<dyn Error>> {
    let config: WorkloadConfig = serde_json::from_str(r#"{"num_keys": 10, "num_operations": 20}"#)?;
    assert_eq!(config.read_ratio, 0.8);
    assert_eq!(config.seed, 0);
    assert_eq!(config.distribution, Distribution::Zipfian { theta: 0.99 });

    let config: WorkloadConfig = serde_json::from_str(
        r#"{"num_keys": 10, "num_operations": 20, "distribution": {"type": "zipfian", "theta": 1.5}}"#,
    )?;
    assert_eq!(config.distribution, Distribution::Zipfian { theta: 1.5 });
    let config: WorkloadConfig = serde_json::from_str(
        r#"{"num_keys": 10, "num_operations": 20, "distribution": {"type": "sequential"}}"#,
    )?;
    assert_eq!(config.distribution, Distribution::Sequential);
    Ok(())
}
