//! Synthetic host cells.

use crate::config::SimulatorConfig;
use chembal_mapping::{MappingError, MixtureFraction};
use chembal_model::{CellState, HostChemistry, ReactionRates};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Temperature band of light cells. Light cells carry no fuel.
pub const LIGHT_TEMPERATURE: f64 = 1000.0;
/// Temperature band of heavy cells.
pub const HEAVY_TEMPERATURE: f64 = 2200.0;
/// Cells at or below this are never integrated.
pub const REACTION_TEMPERATURE: f64 = 600.0;
/// Fuel mass fraction of heavy cells.
pub const HEAVY_FUEL: f64 = 0.05;

const DENSITY: f64 = 1.0;
const PRESSURE: f64 = 101_325.0;

/// Molar masses `16, 24, 32, ...` kg/kmol; species 0 is the fuel.
pub fn molar_masses(species: usize) -> Vec<f64> {
    (0..species).map(|i| 16.0 + 8.0 * i as f64).collect()
}

pub fn host_chemistry(species: usize) -> HostChemistry {
    HostChemistry::new(molar_masses(species), REACTION_TEMPERATURE)
}

/// Mixing coordinate conserved by the fuel-to-product reaction: 0 for light
/// cells, 1 for heavy cells whether fresh or burnt.
///
/// The product is weighted by `W_product / W_fuel`, so
/// `c_fuel + c_product * W_product / W_fuel` is unchanged when
/// [`RelaxationSolver`](crate::RelaxationSolver) moves mass between the two.
pub fn mixture_fraction(species: usize) -> Result<MixtureFraction, MappingError> {
    let masses = molar_masses(species);
    let mut weights = vec![0.0; species];
    if let (Some(w_fuel), Some(w_product)) = (masses.first(), masses.last()) {
        if let Some(product) = weights.last_mut() {
            *product = w_product / w_fuel;
        }
        if let Some(fuel) = weights.first_mut() {
            *fuel = 1.0;
        }
    }
    MixtureFraction::from_streams(
        weights,
        &stream_concentrations(&masses, 0.0),
        &stream_concentrations(&masses, HEAVY_FUEL),
    )
}

/// Concentrations of a cell with the given fuel mass fraction.
fn stream_concentrations(masses: &[f64], fuel: f64) -> Vec<f64> {
    mass_fractions(masses.len(), fuel)
        .iter()
        .zip(masses)
        .map(|(y, w)| DENSITY * y / w)
        .collect()
}

fn mass_fractions(species: usize, fuel: f64) -> Vec<f64> {
    let rest = (1.0 - fuel) / (species.saturating_sub(1).max(1)) as f64;
    (0..species).map(|i| if i == 0 { fuel } else { rest }).collect()
}

/// Initial cells of `worker`: heavy cells first, then light ones.
///
/// Temperatures carry a small seeded jitter so runs are reproducible.
pub fn initial_cells(config: &SimulatorConfig, worker: usize) -> Vec<CellState> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(worker as u64));
    let heavy = config.heavy.heavy_cells(worker, config.cells_per_worker);

    (0..config.cells_per_worker)
        .map(|i| {
            let (temperature, fuel) = if i < heavy {
                (HEAVY_TEMPERATURE + rng.gen_range(0.0..100.0), HEAVY_FUEL)
            } else {
                (LIGHT_TEMPERATURE + rng.gen_range(0.0..4.0), 0.0)
            };
            CellState {
                temperature,
                pressure: PRESSURE,
                density: DENSITY,
                mass_fractions: mass_fractions(config.species, fuel),
                chem_sub_step: config.flow_time_step,
                cost: 0.0,
            }
        })
        .collect()
}

/// Advance cell compositions by one flow step with the new rates and pick up
/// measured costs and sub-steps.
pub fn advance_cells(
    cells: &mut [CellState],
    rates: &ReactionRates,
    host: &HostChemistry,
    flow_time_step: f64,
) {
    for (index, cell) in cells.iter_mut().enumerate() {
        let id = chembal_types::CellId(index as u64);
        if let Some(rr) = rates.rates(id) {
            for (y, rate) in cell.mass_fractions.iter_mut().zip(rr) {
                *y = (*y + rate * flow_time_step / cell.density).max(0.0);
            }
        }
        if cell.temperature > host.reaction_temperature {
            cell.cost = rates.cost(id).unwrap_or(cell.cost);
            cell.chem_sub_step = rates.sub_step(id).unwrap_or(cell.chem_sub_step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeavyPattern;
    use crate::solver::RelaxationSolver;
    use chembal_model::ChemistrySolver;
    use chembal_types::{CellId, WorkUnit};

    #[test]
    fn test_heavy_cells_lead() {
        let config = SimulatorConfig::new(4, 10).with_heavy(HeavyPattern::new(2, 0.3));
        let heavy = initial_cells(&config, 2);
        let light = initial_cells(&config, 1);

        let hot = heavy.iter().filter(|c| c.temperature >= HEAVY_TEMPERATURE).count();
        assert_eq!(hot, 3);
        assert!(heavy[..3].iter().all(|c| c.mass_fractions[0] == HEAVY_FUEL));
        assert!(light.iter().all(|c| c.temperature < LIGHT_TEMPERATURE + 4.0));
        assert!(light.iter().all(|c| c.mass_fractions[0] == 0.0));
    }

    #[test]
    fn test_cells_are_reproducible() {
        let config = SimulatorConfig::new(2, 5).with_seed(7);
        assert_eq!(initial_cells(&config, 1), initial_cells(&config, 1));
        assert_ne!(initial_cells(&config, 0), initial_cells(&config, 1));
    }

    #[test]
    fn test_mixture_fraction_spans_light_to_heavy() {
        let mixture = mixture_fraction(4).unwrap();
        let host = host_chemistry(4);
        let light = host.concentrations(DENSITY, &mass_fractions(4, 0.0)).unwrap();
        let fresh = host
            .concentrations(DENSITY, &mass_fractions(4, HEAVY_FUEL))
            .unwrap();
        assert_eq!(mixture.coordinate(&light), Some(0.0));
        assert!((mixture.coordinate(&fresh).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_burnt_heavy_cells_keep_their_coordinate() {
        let mixture = mixture_fraction(4).unwrap();
        let host = host_chemistry(4);
        let solver = RelaxationSolver::new(host.molar_masses.clone());
        let mut unit = WorkUnit {
            concentrations: host
                .concentrations(DENSITY, &mass_fractions(4, HEAVY_FUEL))
                .unwrap(),
            temperature: HEAVY_TEMPERATURE,
            pressure: PRESSURE,
            density: DENSITY,
            chem_sub_step: 1e-5,
            flow_time_step: 1e-5,
            cost: 0.0,
            cell: CellId(0),
        };
        for _ in 0..5 {
            unit.concentrations = solver.integrate(&unit).final_concentrations;
        }

        assert!(unit.concentrations[0] < 1e-3 * HEAVY_FUEL / 16.0);
        let z = mixture.coordinate(&unit.concentrations).unwrap();
        assert!((z - 1.0).abs() < 1e-9, "z = {z}");
    }

    #[test]
    fn test_mass_fractions_sum_to_one() {
        let y = mass_fractions(5, 0.2);
        assert!((y.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
