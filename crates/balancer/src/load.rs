//! Load measurement.

use chembal_types::{LoadMetric, WorkUnit, WorkerId};

/// Summarise a worker's local units into its [`LoadMetric`].
///
/// The cost is the sum of each unit's last measured solve cost, so it always
/// lags one step behind. An empty list yields zero cost and zero units.
pub fn compute_load(worker: WorkerId, units: &[WorkUnit]) -> LoadMetric {
    let cost = units.iter().map(|unit| unit.cost.max(0.0)).sum();
    LoadMetric::new(worker, cost, units.len())
}

/// Mean cost over all workers, zero for an empty slice.
pub fn mean_cost(loads: &[LoadMetric]) -> f64 {
    if loads.is_empty() {
        return 0.0;
    }
    loads.iter().map(|l| l.cost).sum::<f64>() / loads.len() as f64
}

/// Ratio of the heaviest worker's cost to the mean.
///
/// `1.0` is perfectly balanced. Returns `1.0` when there is no load at all.
pub fn load_imbalance(loads: &[LoadMetric]) -> f64 {
    let mean = mean_cost(loads);
    if mean <= 0.0 {
        return 1.0;
    }
    let max = loads.iter().map(|l| l.cost).fold(0.0_f64, f64::max);
    max / mean
}
