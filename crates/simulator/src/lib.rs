//! Synthetic-load benchmark for the chemistry load balancer.
//!
//! Runs [`BalancedChemistryModel`](chembal_model::BalancedChemistryModel) on
//! generated cells, one thread per worker over a
//! [`MemoryNetwork`](chembal_network_memory::MemoryNetwork):
//!
//! - **Workload**: every n-th worker gets a fraction of hot, stiff cells
//!   ([`HeavyPattern`]); the rest are cool and fuel-free, so they are
//!   candidates for reference mapping.
//! - **Chemistry**: [`RelaxationSolver`], a fuel-to-product relaxation whose
//!   cost grows with temperature.
//! - **Report**: per-step imbalance before and after balancing, mapped
//!   units, phase times, exchange traffic and the run's metrics, collected
//!   by a [`CountingRecorder`](chembal_metrics_memory::CountingRecorder)
//!   scoped to the worker threads.
//!
//! # Example
//!
//! ```no_run
//! use chembal_simulator::{HeavyPattern, Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(8, 500)
//!     .with_steps(20)
//!     .with_heavy(HeavyPattern::new(4, 0.5));
//!
//! let report = Simulator::new(config)?.run()?;
//! report.print_summary();
//! # Ok::<(), chembal_simulator::SimulatorError>(())
//! ```

mod config;
mod error;
mod report;
mod runner;
mod solver;
mod workload;

pub use config::{HeavyPattern, SimulatorConfig};
pub use error::SimulatorError;
pub use report::{SimulationReport, StepStats, WorkerStep};
pub use runner::Simulator;
pub use solver::RelaxationSolver;
pub use workload::{
    host_chemistry, initial_cells, mixture_fraction, molar_masses, HEAVY_FUEL, HEAVY_TEMPERATURE,
    LIGHT_TEMPERATURE, REACTION_TEMPERATURE,
};
