//! Mixing coordinate.

use crate::error::MappingError;

/// Normalised mixing coordinate computed from species concentrations.
///
/// `beta = sum(weights[i] * c[i])` is mapped linearly so that `lower_bound`
/// becomes 0 and `upper_bound` becomes 1. Units close to 0 are treated as
/// unreacted.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureFraction {
    weights: Vec<f64>,
    lower_bound: f64,
    upper_bound: f64,
}

impl MixtureFraction {
    pub fn new(weights: Vec<f64>, lower_bound: f64, upper_bound: f64) -> Result<Self, MappingError> {
        if weights.is_empty() {
            return Err(MappingError::EmptyWeights);
        }
        if lower_bound == upper_bound {
            return Err(MappingError::DegenerateBounds(lower_bound));
        }
        Ok(Self {
            weights,
            lower_bound,
            upper_bound,
        })
    }

    /// Calibrate the bounds from the two boundary streams.
    ///
    /// `unreacted` maps to 0 and `reacted` to 1.
    pub fn from_streams(
        weights: Vec<f64>,
        unreacted: &[f64],
        reacted: &[f64],
    ) -> Result<Self, MappingError> {
        for stream in [unreacted, reacted] {
            if stream.len() != weights.len() {
                return Err(MappingError::SpeciesMismatch {
                    expected: weights.len(),
                    actual: stream.len(),
                });
            }
        }
        let lower = weighted_sum(&weights, unreacted);
        let upper = weighted_sum(&weights, reacted);
        Self::new(weights, lower, upper)
    }

    pub fn species_count(&self) -> usize {
        self.weights.len()
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower_bound, self.upper_bound)
    }

    /// Coordinate of `concentrations`, or `None` if the species count differs.
    pub fn coordinate(&self, concentrations: &[f64]) -> Option<f64> {
        if concentrations.len() != self.weights.len() {
            return None;
        }
        let beta = weighted_sum(&self.weights, concentrations);
        Some((beta - self.lower_bound) / (self.upper_bound - self.lower_bound))
    }
}

fn weighted_sum(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_is_normalised() {
        let mixture = MixtureFraction::new(vec![1.0, 2.0], 1.0, 5.0).unwrap();
        assert_eq!(mixture.coordinate(&[1.0, 0.0]), Some(0.0));
        assert_eq!(mixture.coordinate(&[1.0, 2.0]), Some(1.0));
        assert_eq!(mixture.coordinate(&[3.0, 0.0]), Some(0.5));
    }

    #[test]
    fn test_species_mismatch_has_no_coordinate() {
        let mixture = MixtureFraction::new(vec![1.0, 2.0], 0.0, 1.0).unwrap();
        assert_eq!(mixture.coordinate(&[1.0]), None);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(matches!(
            MixtureFraction::new(vec![], 0.0, 1.0),
            Err(MappingError::EmptyWeights)
        ));
        assert!(matches!(
            MixtureFraction::new(vec![1.0], 2.0, 2.0),
            Err(MappingError::DegenerateBounds(_))
        ));
    }

    #[test]
    fn test_from_streams() {
        let mixture =
            MixtureFraction::from_streams(vec![0.5, 1.0], &[2.0, 0.0], &[0.0, 3.0]).unwrap();
        assert_eq!(mixture.bounds(), (1.0, 3.0));
        assert_eq!(mixture.coordinate(&[2.0, 0.0]), Some(0.0));

        assert!(matches!(
            MixtureFraction::from_streams(vec![1.0], &[1.0, 2.0], &[0.0]),
            Err(MappingError::SpeciesMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }
}
