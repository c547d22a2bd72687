//! Reference-mapping state carried across steps.

use crate::WorkUnit;
use serde::{Deserialize, Serialize};

/// Whether a representative unit has been elected for reference mapping.
///
/// The value is threaded explicitly through each step: the mapper takes the
/// previous state and returns the next one. Within one step it only ever moves
/// from [`NoReferenceYet`](Self::NoReferenceYet) to
/// [`Established`](Self::Established).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ReferenceState {
    #[default]
    NoReferenceYet,
    Established { reference: WorkUnit },
}

impl ReferenceState {
    pub fn is_established(&self) -> bool {
        matches!(self, Self::Established { .. })
    }

    /// The elected reference unit, if any.
    pub fn reference(&self) -> Option<&WorkUnit> {
        match self {
            Self::NoReferenceYet => None,
            Self::Established { reference } => Some(reference),
        }
    }
}
