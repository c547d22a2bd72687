//! Run-wide reference election.

use crate::error::MappingError;
use chembal_network::{all_gather, Transport};
use chembal_types::{ReferenceState, WireMessage, WorkUnit};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One worker's nominee for the reference, if it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCandidate(pub Option<WorkUnit>);

impl WireMessage for ReferenceCandidate {
    fn message_type_id() -> &'static str {
        "reference.candidate"
    }
}

/// Gather every worker's candidate and elect the hottest as the reference.
///
/// Every worker must call this every step, with or without a candidate, so
/// the gather lines up. Ties go to the lowest worker id. If no worker has a
/// candidate the previous state is returned unchanged, so an established
/// reference is never lost.
pub fn elect_global_reference<N>(
    transport: &N,
    candidate: Option<&WorkUnit>,
    previous: ReferenceState,
) -> Result<ReferenceState, MappingError>
where
    N: Transport + ?Sized,
{
    let gathered = all_gather(transport, &ReferenceCandidate(candidate.cloned()))?;

    let mut elected: Option<WorkUnit> = None;
    for nominee in gathered.into_iter().filter_map(|c| c.0) {
        match &elected {
            Some(best) if nominee.temperature <= best.temperature => {}
            _ => elected = Some(nominee),
        }
    }

    match elected {
        Some(reference) => {
            debug!(
                worker = %transport.local(),
                temperature = reference.temperature,
                cell = %reference.cell,
                "Reference elected"
            );
            chembal_metrics::record_reference_elected(reference.temperature);
            Ok(ReferenceState::Established { reference })
        }
        None => Ok(previous),
    }
}
