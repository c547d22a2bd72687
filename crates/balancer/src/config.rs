//! Balancer configuration.

use crate::strategy::StrategyKind;

/// Load balancer configuration.
#[derive(Debug, Clone)]
pub struct BalancerConfig {
    /// Policy used to turn gathered loads into a plan.
    pub strategy: StrategyKind,

    /// Check every computed plan for global consistency before executing it.
    ///
    /// An inconsistent plan is reported as an error, which callers treat as
    /// fatal: exchanging along it would misalign buffers permanently.
    pub validate_plans: bool,

    /// Transfers worth less than this fraction of the mean load are skipped
    /// by strategies that can produce many small edges.
    pub min_transfer_fraction: f64,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::MinMaxPair,
            validate_plans: true,
            min_transfer_fraction: 0.01,
        }
    }
}

impl BalancerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the balancing strategy.
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enable or disable plan validation.
    pub fn with_validate_plans(mut self, validate: bool) -> Self {
        self.validate_plans = validate;
        self
    }

    /// Set the minimum transfer size as a fraction of the mean load.
    pub fn with_min_transfer_fraction(mut self, fraction: f64) -> Self {
        self.min_transfer_fraction = fraction;
        self
    }
}
