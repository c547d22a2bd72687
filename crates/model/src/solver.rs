//! The ODE integrator seam.

use chembal_types::WorkUnit;

/// Outcome of integrating one unit over its flow time step.
#[derive(Debug, Clone, PartialEq)]
pub struct Integration {
    /// Concentrations at the end of the flow time step.
    pub final_concentrations: Vec<f64>,
    /// Recommended chemistry sub-step for the next step.
    pub chem_sub_step: f64,
    /// Cost the solver attributes to this integration. Used only with
    /// [`CostMeasurement::Reported`](crate::CostMeasurement::Reported).
    pub cost: f64,
}

/// Chemical kinetics integrator supplied by the host.
///
/// Must be a pure function of the unit: the same unit is integrated on
/// whichever worker ends up holding it.
pub trait ChemistrySolver: Send + Sync {
    fn integrate(&self, unit: &WorkUnit) -> Integration;
}

impl<S: ChemistrySolver + ?Sized> ChemistrySolver for &S {
    fn integrate(&self, unit: &WorkUnit) -> Integration {
        (**self).integrate(unit)
    }
}

impl<S: ChemistrySolver + ?Sized> ChemistrySolver for Box<S> {
    fn integrate(&self, unit: &WorkUnit) -> Integration {
        (**self).integrate(unit)
    }
}
