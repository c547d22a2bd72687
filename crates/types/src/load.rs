//! Per-worker load summary.

use crate::WorkerId;
use serde::{Deserialize, Serialize};

/// One worker's current workload.
///
/// `cost` is the sum of the measured solve costs of the worker's local units
/// from the previous step; it is always one step stale. `units` is the number
/// of units the worker holds now, so every worker can convert a cost to move
/// into a unit count without asking the owner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadMetric {
    pub worker: WorkerId,
    pub cost: f64,
    pub units: usize,
}

impl LoadMetric {
    pub fn new(worker: WorkerId, cost: f64, units: usize) -> Self {
        Self {
            worker,
            cost,
            units,
        }
    }

    /// Mean cost of one of this worker's units, or `None` when it holds none.
    pub fn cost_per_unit(&self) -> Option<f64> {
        if self.units == 0 || self.cost <= 0.0 {
            None
        } else {
            Some(self.cost / self.units as f64)
        }
    }
}
