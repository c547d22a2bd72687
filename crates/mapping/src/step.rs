//! The per-step mapping pass.

use crate::election::elect_global_reference;
use crate::error::MappingError;
use crate::mapper::ReferenceMapper;
use chembal_network::Transport;
use chembal_types::{ReferenceState, ResultUnit, WorkUnit};
use tracing::debug;

/// Result of one mapping pass on one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutcome {
    /// Units that still have to be balanced and solved, in input order.
    pub remaining: Vec<WorkUnit>,
    /// Results for the mapped units, in input order.
    pub mapped: Vec<ResultUnit>,
    /// State to pass to the next step.
    pub state: ReferenceState,
}

/// Elect the reference and resolve every mappable local unit from it.
///
/// `solve` is called at most once, on the elected reference, and only if at
/// least one local unit maps. Its error type only needs to absorb
/// [`MappingError`]. A disabled mapper passes all units through
/// without joining the election; the setting must be the same on every
/// worker.
pub fn map_step<N, F, E>(
    mapper: &ReferenceMapper,
    transport: &N,
    units: Vec<WorkUnit>,
    previous: ReferenceState,
    solve: F,
) -> Result<MappingOutcome, E>
where
    N: Transport + ?Sized,
    F: FnOnce(&WorkUnit) -> Result<ResultUnit, E>,
    E: From<MappingError>,
{
    if !mapper.is_enabled() {
        return Ok(MappingOutcome {
            remaining: units,
            mapped: Vec::new(),
            state: previous,
        });
    }

    let state = elect_global_reference(transport, mapper.candidate(&units), previous)
        .map_err(E::from)?;

    let (to_map, remaining): (Vec<WorkUnit>, Vec<WorkUnit>) = units
        .into_iter()
        .partition(|unit| mapper.should_map(unit, &state));

    let mapped = match (state.reference(), to_map.is_empty()) {
        (Some(reference), false) => {
            let reference_result = solve(reference)?;
            to_map
                .iter()
                .map(|unit| reference_result.mapped_onto(unit))
                .collect()
        }
        _ => Vec::new(),
    };

    if !mapped.is_empty() {
        chembal_metrics::record_mapped_units(mapped.len());
        debug!(
            worker = %transport.local(),
            mapped = mapped.len(),
            remaining = remaining.len(),
            "Units mapped onto reference"
        );
    }

    Ok(MappingOutcome {
        remaining,
        mapped,
        state,
    })
}
