//! Chemistry load-balancing simulator CLI
//!
//! # Example
//!
//! ```bash
//! # Eight workers, every fourth one with half its cells hot
//! chembal-sim -w 8 -c 500 --heavy-every 4 --heavy-fraction 0.5
//!
//! # Greedy pairing with reference mapping and timing logs
//! chembal-sim -w 16 --strategy greedy --mapping --log-dir out/
//! ```

use chembal_balancer::StrategyKind;
use chembal_model::CostMeasurement;
use chembal_simulator::{HeavyPattern, Simulator, SimulatorConfig};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Chemistry load-balancing simulator
///
/// Runs the balanced chemistry step on synthetic cells, one thread per
/// worker. Reproducible when the same seed is used and costs are reported.
#[derive(Parser, Debug)]
#[command(name = "chembal-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of workers
    #[arg(short = 'w', long, default_value = "4")]
    workers: usize,

    /// Cells per worker
    #[arg(short = 'c', long, default_value = "200")]
    cells: usize,

    /// Number of species (at least 3)
    #[arg(long, default_value = "4")]
    species: usize,

    /// Number of flow steps
    #[arg(short = 'n', long, default_value = "10")]
    steps: usize,

    /// Flow time step in seconds
    #[arg(long, default_value = "1e-5")]
    dt: f64,

    /// Every n-th worker gets heavy cells (0 for none)
    #[arg(long, default_value = "4")]
    heavy_every: usize,

    /// Fraction of a heavy worker's cells that are heavy
    #[arg(long, default_value = "0.5")]
    heavy_fraction: f64,

    /// Balancing strategy (min-max-pair or greedy)
    #[arg(long, default_value = "min-max-pair")]
    strategy: StrategyKind,

    /// Map cool, fuel-free cells onto a shared reference
    #[arg(long)]
    mapping: bool,

    /// Measure solve cost with wall time instead of the solver's estimate
    #[arg(long)]
    wall_clock: bool,

    /// Random seed for cell temperatures. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for per-worker timing logs
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,chembal_simulator=info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let mut config = SimulatorConfig::new(args.workers, args.cells)
        .with_species(args.species)
        .with_steps(args.steps)
        .with_flow_time_step(args.dt)
        .with_seed(seed)
        .with_heavy(HeavyPattern::new(args.heavy_every, args.heavy_fraction))
        .with_strategy(args.strategy)
        .with_mapping(args.mapping);
    if args.wall_clock {
        config = config.with_cost_measurement(CostMeasurement::WallClock);
    }
    if let Some(dir) = args.log_dir {
        config = config.with_log_dir(dir);
    }

    let report = match Simulator::new(config).and_then(|simulator| simulator.run()) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Simulation failed");
            process::exit(1);
        }
    };

    report.print_summary();
}
