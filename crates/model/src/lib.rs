//! Load-balanced chemistry for a host flow solver.
//!
//! [`BalancedChemistryModel::solve`] is the host's per-step entry point. It
//! takes this worker's work units and, in order:
//!
//! | Phase | Work |
//! |---|---|
//! | `get_problem` | reference mapping: mappable units are resolved locally |
//! | `updateState` | load gather and plan computation |
//! | `balance` | surplus units shipped to receivers |
//! | `solveBuffer` | every unit held after balancing is integrated |
//! | `unbalance` | results shipped back to their origin worker |
//!
//! Results for this worker's own cells are handed to a [`ResultSink`] and the
//! smallest recommended chemistry sub-step is returned. Phase timings go to
//! an optional per-worker [`TimingLog`].
//!
//! The ODE integration itself is behind the [`ChemistrySolver`] trait.
//! [`HostChemistry`] and [`ReactionRates`] cover the host side: building work
//! units from cell state and turning results into reaction rates.

mod config;
mod error;
mod host;
mod model;
mod solver;
mod timing;

pub use config::{CostMeasurement, ModelConfig};
pub use error::ModelError;
pub use host::{CellState, HostChemistry, ReactionRates};
pub use model::{BalancedChemistryModel, ResultSink, StepSummary};
pub use solver::{ChemistrySolver, Integration};
pub use timing::{PhaseTimings, TimingLog, TIMING_LOG_HEADER};
