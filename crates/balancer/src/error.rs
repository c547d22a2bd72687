use crate::partition::PartitionError;
use crate::plan::PlanError;
use chembal_network::ExchangeError;
use chembal_types::WorkerId;
use thiserror::Error;

/// Errors from a balancing step.
///
/// All of these are structural: the plan and the data on some worker no
/// longer agree, so the run cannot continue safely.
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("partition failed: {0}")]
    Partition(#[from] PartitionError),

    #[error("invalid redistribution plan: {0}")]
    Plan(#[from] PlanError),

    #[error("exchange failed: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("plan covers {plan} workers but the communicator has {communicator}")]
    PlanSizeMismatch { plan: usize, communicator: usize },

    #[error("worker {0} has no role in the current plan")]
    MissingRole(WorkerId),
}
