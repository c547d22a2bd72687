//! Simulator errors.

use chembal_mapping::MappingError;
use chembal_model::ModelError;
use chembal_types::WorkerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("log directory: {0}")]
    LogDir(#[from] std::io::Error),

    #[error("worker {0} panicked")]
    WorkerPanicked(WorkerId),
}
