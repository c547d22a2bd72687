//! Mapping decision for single units.

use crate::mixture::MixtureFraction;
use chembal_types::{ReferenceState, WorkUnit};

/// Reference mapping configuration.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Run the mapping pass at all. When off, every unit is solved.
    pub enabled: bool,

    /// Units whose mixing coordinate is below this value count as unreacted.
    pub tolerance: f64,

    /// Maximum temperature difference (K) to an established reference.
    pub temperature_tolerance: f64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tolerance: 1e-4,
            temperature_tolerance: 5.0,
        }
    }
}

impl MapperConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the mapping pass.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the mixing-coordinate tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the temperature tolerance.
    pub fn with_temperature_tolerance(mut self, tolerance: f64) -> Self {
        self.temperature_tolerance = tolerance;
        self
    }
}

/// Decides which units can reuse the reference result.
#[derive(Debug, Clone)]
pub struct ReferenceMapper {
    config: MapperConfig,
    mixture: MixtureFraction,
}

impl ReferenceMapper {
    pub fn new(config: MapperConfig, mixture: MixtureFraction) -> Self {
        Self { config, mixture }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn mixture(&self) -> &MixtureFraction {
        &self.mixture
    }

    /// Whether `unit` is near the unreacted extreme.
    ///
    /// Units whose species count does not match the configured weights are
    /// never near anything.
    pub fn is_unreacted(&self, unit: &WorkUnit) -> bool {
        self.mixture
            .coordinate(&unit.concentrations)
            .is_some_and(|z| z < self.config.tolerance)
    }

    /// Whether `unit` may reuse the reference result under `state`.
    ///
    /// Without a reference only the mixing coordinate counts; once one is
    /// established the temperature must also be within tolerance of it.
    pub fn should_map(&self, unit: &WorkUnit, state: &ReferenceState) -> bool {
        if !self.is_unreacted(unit) {
            return false;
        }
        match state.reference() {
            None => true,
            Some(reference) => {
                (unit.temperature - reference.temperature).abs() < self.config.temperature_tolerance
            }
        }
    }

    /// This worker's nominee for the global election: its first unreacted
    /// unit, regardless of temperature.
    pub fn candidate<'a>(&self, units: &'a [WorkUnit]) -> Option<&'a WorkUnit> {
        units.iter().find(|unit| self.is_unreacted(unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chembal_test_helpers::fixtures::unit_with_state;

    fn mapper() -> ReferenceMapper {
        let mixture = MixtureFraction::new(vec![1.0, 0.0], 0.0, 1.0).unwrap();
        ReferenceMapper::new(
            MapperConfig::new()
                .with_enabled(true)
                .with_tolerance(0.1)
                .with_temperature_tolerance(10.0),
            mixture,
        )
    }

    #[test]
    fn test_lower_bound_maps_without_reference() {
        let unit = unit_with_state(0, vec![0.0, 1.0], 900.0);
        assert!(mapper().should_map(&unit, &ReferenceState::NoReferenceYet));
    }

    #[test]
    fn test_reacted_unit_never_maps() {
        let unit = unit_with_state(0, vec![0.5, 0.5], 900.0);
        assert!(!mapper().should_map(&unit, &ReferenceState::NoReferenceYet));
    }

    #[test]
    fn test_temperature_checked_once_established() {
        let mapper = mapper();
        let state = ReferenceState::Established {
            reference: unit_with_state(9, vec![0.0, 1.0], 900.0),
        };

        assert!(mapper.should_map(&unit_with_state(1, vec![0.05, 0.95], 905.0), &state));
        assert!(!mapper.should_map(&unit_with_state(2, vec![0.05, 0.95], 950.0), &state));
    }

    #[test]
    fn test_candidate_ignores_temperature() {
        let mapper = mapper();
        let units = vec![
            unit_with_state(0, vec![0.9, 0.1], 2000.0),
            unit_with_state(1, vec![0.0, 1.0], 400.0),
            unit_with_state(2, vec![0.0, 1.0], 600.0),
        ];
        assert_eq!(mapper.candidate(&units).map(|u| u.cell.0), Some(1));
        assert!(mapper.candidate(&units[..1]).is_none());
    }

    #[test]
    fn test_species_mismatch_never_maps() {
        let unit = unit_with_state(0, vec![0.0], 900.0);
        assert!(!mapper().should_map(&unit, &ReferenceState::NoReferenceYet));
    }
}
