use chembal_network::ExchangeError;
use thiserror::Error;

/// Errors from reference mapping.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("mixture fraction needs at least one species weight")]
    EmptyWeights,

    #[error("mixture fraction bounds coincide at {0}")]
    DegenerateBounds(f64),

    #[error("stream has {actual} species but {expected} weights are configured")]
    SpeciesMismatch { expected: usize, actual: usize },

    #[error("reference election failed: {0}")]
    Election(#[from] ExchangeError),
}
