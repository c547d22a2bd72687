//! Host-side assembly of work units and reaction-rate update.

use crate::error::ModelError;
use crate::model::ResultSink;
use chembal_types::{CellId, ResultUnit, WorkUnit};

/// Thermochemical state of one host cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellState {
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    pub mass_fractions: Vec<f64>,
    /// Recommended chemistry sub-step from the previous step.
    pub chem_sub_step: f64,
    /// Measured solve cost from the previous step.
    pub cost: f64,
}

/// Species data the host needs to talk to the balancer.
#[derive(Debug, Clone)]
pub struct HostChemistry {
    /// Molar mass of each species (kg/kmol).
    pub molar_masses: Vec<f64>,
    /// Cells at or below this temperature are not integrated.
    pub reaction_temperature: f64,
}

impl HostChemistry {
    pub fn new(molar_masses: Vec<f64>, reaction_temperature: f64) -> Self {
        Self {
            molar_masses,
            reaction_temperature,
        }
    }

    pub fn species_count(&self) -> usize {
        self.molar_masses.len()
    }

    /// Molar concentrations `c_i = rho * Y_i / W_i`.
    pub fn concentrations(&self, density: f64, mass_fractions: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.check_species("mass fractions", mass_fractions.len())?;
        Ok(mass_fractions
            .iter()
            .zip(&self.molar_masses)
            .map(|(y, w)| density * y / w)
            .collect())
    }

    /// Build this step's work units from host cells, in cell order.
    ///
    /// Cells at or below the reaction temperature never enter the balancer;
    /// their rates in `rates` are zeroed instead.
    pub fn collect_work_units(
        &self,
        cells: &[CellState],
        flow_time_step: f64,
        rates: &mut ReactionRates,
    ) -> Result<Vec<WorkUnit>, ModelError> {
        let mut units = Vec::with_capacity(cells.len());
        for (index, cell) in cells.iter().enumerate() {
            let id = CellId(index as u64);
            if cell.temperature <= self.reaction_temperature {
                rates.clear(id)?;
                continue;
            }
            units.push(WorkUnit {
                concentrations: self.concentrations(cell.density, &cell.mass_fractions)?,
                temperature: cell.temperature,
                pressure: cell.pressure,
                density: cell.density,
                chem_sub_step: cell.chem_sub_step,
                flow_time_step,
                cost: cell.cost,
                cell: id,
            });
        }
        Ok(units)
    }

    fn check_species(&self, what: &'static str, actual: usize) -> Result<(), ModelError> {
        if actual != self.molar_masses.len() {
            return Err(ModelError::SpeciesMismatch {
                what,
                expected: self.molar_masses.len(),
                actual,
            });
        }
        Ok(())
    }
}

/// Per-cell reaction rates, sub-steps and costs written back from results.
#[derive(Debug, Clone)]
pub struct ReactionRates {
    molar_masses: Vec<f64>,
    max_sub_step: f64,
    /// Cell-major: `rates[cell][species]`.
    rates: Vec<Vec<f64>>,
    sub_steps: Vec<f64>,
    costs: Vec<f64>,
}

impl ReactionRates {
    pub fn new(cells: usize, molar_masses: Vec<f64>, max_sub_step: f64) -> Self {
        let species = molar_masses.len();
        Self {
            molar_masses,
            max_sub_step,
            rates: vec![vec![0.0; species]; cells],
            sub_steps: vec![max_sub_step; cells],
            costs: vec![0.0; cells],
        }
    }

    pub fn cells(&self) -> usize {
        self.rates.len()
    }

    /// Reaction rates `RR_j = increment_j * W_j` of a cell.
    pub fn rates(&self, cell: CellId) -> Option<&[f64]> {
        self.rates.get(cell.index()).map(Vec::as_slice)
    }

    pub fn sub_step(&self, cell: CellId) -> Option<f64> {
        self.sub_steps.get(cell.index()).copied()
    }

    pub fn cost(&self, cell: CellId) -> Option<f64> {
        self.costs.get(cell.index()).copied()
    }

    /// Zero the rates of a cell that is not integrated this step.
    pub fn clear(&mut self, cell: CellId) -> Result<(), ModelError> {
        let index = self.index(cell)?;
        self.rates[index].fill(0.0);
        Ok(())
    }

    /// Write one result back to its cell.
    pub fn apply(&mut self, result: &ResultUnit) -> Result<(), ModelError> {
        let index = self.index(result.cell)?;
        if result.increments.len() != self.molar_masses.len() {
            return Err(ModelError::SpeciesMismatch {
                what: "result",
                expected: self.molar_masses.len(),
                actual: result.increments.len(),
            });
        }

        for ((rate, increment), w) in self.rates[index]
            .iter_mut()
            .zip(&result.increments)
            .zip(&self.molar_masses)
        {
            *rate = increment * w;
        }
        self.sub_steps[index] = result.chem_sub_step.min(self.max_sub_step);
        self.costs[index] = result.cost;
        Ok(())
    }

    fn index(&self, cell: CellId) -> Result<usize, ModelError> {
        if cell.index() >= self.rates.len() {
            return Err(ModelError::UnknownCell {
                cell,
                cells: self.rates.len(),
            });
        }
        Ok(cell.index())
    }
}

impl ResultSink for ReactionRates {
    fn accept(&mut self, result: ResultUnit) -> Result<(), ModelError> {
        self.apply(&result)
    }
}
