use chembal_balancer::BalanceError;
use chembal_mapping::MappingError;
use chembal_types::{CellId, WorkUnitError};
use thiserror::Error;

/// Errors from a chemistry step.
///
/// Every variant is fatal for the run: the host should stop all workers.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("solver returned an unusable state: {0}")]
    Solve(#[from] WorkUnitError),

    #[error("timing log: {0}")]
    TimingLog(#[from] std::io::Error),

    #[error("reference mapping is enabled but no mixture fraction is configured")]
    MissingMixtureFraction,

    #[error("{what} has {actual} species, expected {expected}")]
    SpeciesMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("result for cell {cell} outside the {cells} host cells")]
    UnknownCell { cell: CellId, cells: usize },
}
