use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use kvcachelib::config::{HierarchyConfig, LevelConfig, SimulationConfig};
use kvcachelib::simulator::{compare, ComparisonResult, Simulator};
use kvcachelib::workload::{Distribution, Workload, WorkloadConfig, WorkloadStats};

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum WorkloadKind {
    Uniform,
    Zipfian,
    Sequential,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    Default,
    Typical,
    Cloud,
}

/// Level capacities for the typical and cloud presets
const PRESET_CAPACITIES: [usize; 3] = [10, 100, 1000];

#[derive(Parser, Debug)]
#[command(about = String::from("Simulates key-value caches and multilevel cache hierarchies on synthetic workloads"))]
struct Args {
    /// JSON simulation config. When given, the level and workload flags are ignored
    config: Option<String>,

    /// A level as NAME:POLICY:CAPACITY@LATENCY, L1 first. Overrides the preset
    #[arg(short, long = "level")]
    levels: Vec<String>,

    /// The hierarchy to use when no levels are given
    #[arg(long, value_enum, default_value_t = Preset::Default)]
    preset: Preset,

    #[arg(short, long, value_enum, default_value_t = WorkloadKind::Zipfian)]
    workload: WorkloadKind,

    #[arg(short, long, default_value_t = 1000)]
    keys: u64,

    #[arg(short, long, default_value_t = 10_000)]
    operations: usize,

    #[arg(short, long, default_value_t = 0.8)]
    read_ratio: f64,

    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Skew of the zipfian workload
    #[arg(short, long, default_value_t = 0.99)]
    theta: f64,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

impl Args {
    fn simulation_config(&self) -> Result<SimulationConfig, String> {
        if let Some(path) = &self.config {
            let config_file = File::open(path).map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
            return serde_json::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"));
        }
        let hierarchy = if self.levels.is_empty() {
            match self.preset {
                Preset::Default => HierarchyConfig::default(),
                Preset::Typical => HierarchyConfig::typical(PRESET_CAPACITIES),
                Preset::Cloud => HierarchyConfig::cloud(PRESET_CAPACITIES),
            }
        } else {
            let levels = self.levels
                .iter()
                .map(|level| LevelConfig::parse(level))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("Couldn't parse the levels: {e}"))?;
            HierarchyConfig::new("CommandLine", levels)
        };
        let distribution = match self.workload {
            WorkloadKind::Uniform => Distribution::Uniform,
            WorkloadKind::Zipfian => Distribution::Zipfian { theta: self.theta },
            WorkloadKind::Sequential => Distribution::Sequential,
        };
        Ok(SimulationConfig {
            workload: WorkloadConfig {
                num_keys: self.keys,
                num_operations: self.operations,
                read_ratio: self.read_ratio,
                seed: self.seed,
                distribution,
            },
            hierarchies: vec![hierarchy],
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    println!("{}", serde_json::to_string_pretty(value).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    Ok(())
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    let default_filter = if args.debug { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();

    let config = args.simulation_config()?;
    config.validate().map_err(|e| format!("Invalid configuration: {e}"))?;
    let workload = Workload::new(config.workload.clone()).map_err(|e| format!("Invalid workload: {e}"))?;
    let operations = workload.generate();
    debug!(operations = operations.len(), "workload generated");

    if let [hierarchy_config] = config.hierarchies.as_slice() {
        let hierarchy = hierarchy_config.build().map_err(|e| format!("Couldn't build the hierarchy: {e}"))?;
        let mut simulator = Simulator::new(hierarchy).map_err(|e| format!("Couldn't create the simulator: {e}"))?;
        let report = simulator.simulate(&operations).map_err(|e| format!("Simulation failed: {e}"))?;
        print_json(&ComparisonResult {
            name: hierarchy_config.name.clone(),
            report,
        })?;
        if args.performance {
            println!("Simulation time: {}s", simulator.get_execution_time().as_nanos() as f64 / 1e9);
        }
    } else {
        let simulation_start = Instant::now();
        let results = compare(&config.hierarchies, &operations).map_err(|e| format!("Comparison failed: {e}"))?;
        print_json(&results)?;
        if args.performance {
            println!("Comparison time ({} hierarchies in parallel): {}s", results.len(), simulation_start.elapsed().as_nanos() as f64 / 1e9);
        }
    }

    if args.performance {
        let total_time = start.elapsed();
        println!("Total execution time (includes configuration, workload generation, and output): {}s", total_time.as_nanos() as f64 / 1e9);
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        let stats = WorkloadStats::from_operations(&operations);
        println!(
            "Workload: {} operations ({} reads, {} writes) over {} unique keys",
            stats.total_operations, stats.reads, stats.writes, stats.unique_keys
        );
    }
    Ok(())
}
