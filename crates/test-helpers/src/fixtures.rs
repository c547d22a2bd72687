//! Work-unit fixtures.

use chembal_types::{CellId, ResultUnit, WorkUnit, WorkerId};
use rand::Rng;

/// Cell ids of fixture units are offset by `worker * CELL_STRIDE` so units
/// from different workers never collide.
pub const CELL_STRIDE: u64 = 1_000_000;

/// A two-species unit with the given cell and cost.
pub fn unit(cell: u64, cost: f64) -> WorkUnit {
    WorkUnit {
        concentrations: vec![0.5, 0.5],
        temperature: 1500.0,
        pressure: 101_325.0,
        density: 1.0,
        chem_sub_step: 1e-7,
        flow_time_step: 1e-6,
        cost,
        cell: CellId(cell),
    }
}

/// A unit with explicit concentrations and temperature.
pub fn unit_with_state(cell: u64, concentrations: Vec<f64>, temperature: f64) -> WorkUnit {
    WorkUnit {
        concentrations,
        temperature,
        ..unit(cell, 1.0)
    }
}

/// `count` units of equal `cost` owned by `worker`.
pub fn units_for_worker(worker: WorkerId, count: usize, cost: f64) -> Vec<WorkUnit> {
    (0..count as u64)
        .map(|i| unit(worker.0 as u64 * CELL_STRIDE + i, cost))
        .collect()
}

/// Up to `max_units` units for `worker` with random costs in `0.1..10.0`.
pub fn random_units<R: Rng>(rng: &mut R, worker: WorkerId, max_units: usize) -> Vec<WorkUnit> {
    let count = rng.gen_range(0..=max_units);
    (0..count as u64)
        .map(|i| unit(worker.0 as u64 * CELL_STRIDE + i, rng.gen_range(0.1..10.0)))
        .collect()
}

/// Worker a fixture cell id was created on.
pub fn owner_of(cell: CellId) -> WorkerId {
    WorkerId((cell.0 / CELL_STRIDE) as u32)
}

/// A result for `unit` whose single increment encodes the cell id.
///
/// Lets tests check that every result came back to the right cell.
pub fn tagged_result(unit: &WorkUnit) -> ResultUnit {
    ResultUnit {
        increments: vec![unit.cell.0 as f64],
        chem_sub_step: unit.chem_sub_step,
        cost: unit.cost,
        cell: unit.cell,
        density: unit.density,
    }
}
