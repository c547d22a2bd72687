//! Simulator configuration.

use chembal_balancer::StrategyKind;
use chembal_model::CostMeasurement;
use std::path::PathBuf;

/// Which workers carry heavy cells.
///
/// Every `every_n`-th worker (0, n, 2n, ...) turns the first `fraction` of
/// its cells into hot, stiff cells. All other cells are light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeavyPattern {
    pub every_n: usize,
    pub fraction: f64,
}

impl HeavyPattern {
    pub fn new(every_n: usize, fraction: f64) -> Self {
        Self { every_n, fraction }
    }

    /// Whether `worker` gets heavy cells.
    pub fn is_heavy_worker(&self, worker: usize) -> bool {
        self.every_n > 0 && worker % self.every_n == 0
    }

    /// Number of heavy cells `worker` gets out of `cells`.
    pub fn heavy_cells(&self, worker: usize, cells: usize) -> usize {
        if !self.is_heavy_worker(worker) {
            return 0;
        }
        ((cells as f64 * self.fraction.clamp(0.0, 1.0)).round() as usize).min(cells)
    }
}

impl Default for HeavyPattern {
    fn default() -> Self {
        Self {
            every_n: 4,
            fraction: 0.5,
        }
    }
}

/// Simulation configuration.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Number of workers, one thread each.
    pub workers: usize,

    pub cells_per_worker: usize,

    /// Number of species (at least 3: fuel, inert and product).
    pub species: usize,

    pub steps: usize,

    /// Flow time step in seconds.
    pub flow_time_step: f64,

    /// Seed for cell temperatures.
    pub seed: u64,

    pub heavy: HeavyPattern,

    pub strategy: StrategyKind,

    /// Map light cells onto a shared reference.
    pub mapping: bool,

    pub cost_measurement: CostMeasurement,

    /// Directory for per-worker timing logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            cells_per_worker: 200,
            species: 4,
            steps: 10,
            flow_time_step: 1e-5,
            seed: 0,
            heavy: HeavyPattern::default(),
            strategy: StrategyKind::default(),
            mapping: false,
            cost_measurement: CostMeasurement::Reported,
            log_dir: None,
        }
    }
}

impl SimulatorConfig {
    pub fn new(workers: usize, cells_per_worker: usize) -> Self {
        Self {
            workers,
            cells_per_worker,
            ..Self::default()
        }
    }

    pub fn with_species(mut self, species: usize) -> Self {
        self.species = species;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_flow_time_step(mut self, flow_time_step: f64) -> Self {
        self.flow_time_step = flow_time_step;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_heavy(mut self, heavy: HeavyPattern) -> Self {
        self.heavy = heavy;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_mapping(mut self, mapping: bool) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_cost_measurement(mut self, measurement: CostMeasurement) -> Self {
        self.cost_measurement = measurement;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}
