//! Model configuration.

use chembal_balancer::BalancerConfig;
use chembal_mapping::{MapperConfig, MixtureFraction};
use std::path::PathBuf;

/// Where a unit's solve cost comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostMeasurement {
    /// Wall time of the integration on this worker.
    #[default]
    WallClock,
    /// The cost reported by the solver. Deterministic, for benchmarks and
    /// tests.
    Reported,
}

/// Load-balanced chemistry model configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub balancer: BalancerConfig,

    pub mapper: MapperConfig,

    /// Mixing coordinate used by the mapper. Required when mapping is enabled.
    pub mixture: Option<MixtureFraction>,

    /// Upper bound for recommended chemistry sub-steps.
    pub max_sub_step: f64,

    pub cost_measurement: CostMeasurement,

    /// Directory for the per-worker timing log. No log when `None`.
    pub timing_log_dir: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            balancer: BalancerConfig::default(),
            mapper: MapperConfig::default(),
            mixture: None,
            max_sub_step: f64::MAX,
            cost_measurement: CostMeasurement::WallClock,
            timing_log_dir: None,
        }
    }
}

impl ModelConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balancer(mut self, balancer: BalancerConfig) -> Self {
        self.balancer = balancer;
        self
    }

    /// Enable reference mapping with the given settings and coordinate.
    pub fn with_mapping(mut self, mapper: MapperConfig, mixture: MixtureFraction) -> Self {
        self.mapper = mapper;
        self.mixture = Some(mixture);
        self
    }

    pub fn with_max_sub_step(mut self, max_sub_step: f64) -> Self {
        self.max_sub_step = max_sub_step;
        self
    }

    pub fn with_cost_measurement(mut self, measurement: CostMeasurement) -> Self {
        self.cost_measurement = measurement;
        self
    }

    /// Write `cpu_solve_<worker>.out` into `dir`.
    pub fn with_timing_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.timing_log_dir = Some(dir.into());
        self
    }
}
