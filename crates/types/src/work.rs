//! Work and result records.

use crate::CellId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from building records out of inconsistent inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkUnitError {
    #[error("species count mismatch: expected {expected}, got {actual}")]
    SpeciesMismatch { expected: usize, actual: usize },

    #[error("flow time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),
}

/// One cell's chemistry-integration task.
///
/// Created fresh each step from field data and immutable once queued for
/// exchange. The `cost` field carries the solve cost measured for this cell
/// in the previous step; it is what the balancer sums into a worker's load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Molar concentration of each species, in species order.
    pub concentrations: Vec<f64>,
    /// Temperature [K].
    pub temperature: f64,
    /// Pressure [Pa].
    pub pressure: f64,
    /// Density [kg/m^3]. Carried through to the result for the host.
    pub density: f64,
    /// Current chemistry sub-step size.
    pub chem_sub_step: f64,
    /// Flow time step the integration must cover.
    pub flow_time_step: f64,
    /// Last measured solve cost of this cell.
    pub cost: f64,
    /// Origin cell, used to route the result home.
    pub cell: CellId,
}

impl WorkUnit {
    /// Number of species carried by this unit.
    #[inline]
    pub fn species_count(&self) -> usize {
        self.concentrations.len()
    }
}

/// Outcome of integrating one [`WorkUnit`].
///
/// Created by the solving step and consumed by the rate update. Never mutated
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultUnit {
    /// Concentration change per unit flow time, `(c_end - c_start) / dt`.
    pub increments: Vec<f64>,
    /// Recommended chemistry sub-step for the next flow step.
    pub chem_sub_step: f64,
    /// Measured (or reported) solve cost.
    pub cost: f64,
    /// Origin cell, copied from the work unit.
    pub cell: CellId,
    /// Density, copied from the work unit.
    pub density: f64,
}

impl ResultUnit {
    /// Build a result from the concentrations at the end of the flow step.
    ///
    /// Increments are normalised by the unit's flow time step, and the
    /// recommended sub-step is clamped to `max_sub_step`.
    pub fn from_final_state(
        unit: &WorkUnit,
        final_concentrations: &[f64],
        chem_sub_step: f64,
        max_sub_step: f64,
        cost: f64,
    ) -> Result<Self, WorkUnitError> {
        if final_concentrations.len() != unit.concentrations.len() {
            return Err(WorkUnitError::SpeciesMismatch {
                expected: unit.concentrations.len(),
                actual: final_concentrations.len(),
            });
        }
        if unit.flow_time_step <= 0.0 {
            return Err(WorkUnitError::NonPositiveTimeStep(unit.flow_time_step));
        }

        let increments = final_concentrations
            .iter()
            .zip(&unit.concentrations)
            .map(|(end, start)| (end - start) / unit.flow_time_step)
            .collect();

        Ok(Self {
            increments,
            chem_sub_step: chem_sub_step.min(max_sub_step),
            cost,
            cell: unit.cell,
            density: unit.density,
        })
    }

    /// Reuse this result for another cell.
    ///
    /// Increments, sub-step and cost are shared; routing id and density come
    /// from the target unit.
    pub fn mapped_onto(&self, unit: &WorkUnit) -> Self {
        Self {
            increments: self.increments.clone(),
            chem_sub_step: self.chem_sub_step,
            cost: self.cost,
            cell: unit.cell,
            density: unit.density,
        }
    }
}
