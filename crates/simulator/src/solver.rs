//! Synthetic stiff chemistry.

use chembal_model::{ChemistrySolver, Integration};
use chembal_types::WorkUnit;
use parking_lot::Mutex;

/// One-step fuel-to-product relaxation with Arrhenius rate
/// `k = A * exp(-Ta / T)`, integrated with implicit Euler sub-steps.
///
/// The number of sub-steps grows with `k * dt`, so hot cells cost far more
/// than cool ones. The reported cost is the sub-step count times
/// `cost_per_sub_step`. Species 0 is the fuel, the last species the product.
#[derive(Debug)]
pub struct RelaxationSolver {
    molar_masses: Vec<f64>,
    pre_exponential: f64,
    activation_temperature: f64,
    /// Sub-steps per unit of `k * dt`.
    resolution: f64,
    max_sub_steps: usize,
    cost_per_sub_step: f64,
    /// Reported cost of everything integrated since the last `take_work`.
    work: Mutex<f64>,
}

impl RelaxationSolver {
    pub fn new(molar_masses: Vec<f64>) -> Self {
        Self {
            molar_masses,
            pre_exponential: 1e9,
            activation_temperature: 15_000.0,
            resolution: 100.0,
            max_sub_steps: 5_000,
            cost_per_sub_step: 1e-6,
            work: Mutex::new(0.0),
        }
    }

    /// Arrhenius rate constant at `temperature`.
    pub fn rate_constant(&self, temperature: f64) -> f64 {
        self.pre_exponential * (-self.activation_temperature / temperature).exp()
    }

    /// Sub-steps needed to integrate `unit` over its flow time step.
    pub fn sub_steps(&self, unit: &WorkUnit) -> usize {
        let stiffness = self.rate_constant(unit.temperature) * unit.flow_time_step;
        ((stiffness * self.resolution).ceil() as usize).clamp(1, self.max_sub_steps)
    }

    /// Cost `unit` would report, without integrating it.
    pub fn cost_of(&self, unit: &WorkUnit) -> f64 {
        self.sub_steps(unit) as f64 * self.cost_per_sub_step
    }

    /// Return the accumulated cost and reset it.
    pub fn take_work(&self) -> f64 {
        std::mem::take(&mut *self.work.lock())
    }
}

impl ChemistrySolver for RelaxationSolver {
    fn integrate(&self, unit: &WorkUnit) -> Integration {
        let k = self.rate_constant(unit.temperature);
        let n = self.sub_steps(unit);
        let h = unit.flow_time_step / n as f64;

        let mut c = unit.concentrations.clone();
        let product = c.len().saturating_sub(1);
        let masses = (self.molar_masses.first(), self.molar_masses.get(product));
        if let (true, (Some(w_fuel), Some(w_product))) = (product > 0, masses) {
            let ratio = w_fuel / w_product;
            for _ in 0..n {
                let fuel = c[0] / (1.0 + h * k);
                c[product] += (c[0] - fuel) * ratio;
                c[0] = fuel;
            }
        }

        let cost = n as f64 * self.cost_per_sub_step;
        *self.work.lock() += cost;
        Integration {
            final_concentrations: c,
            chem_sub_step: h,
            cost,
        }
    }
}
