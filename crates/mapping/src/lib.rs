//! Reference mapping.
//!
//! Many cells near the unreacted extreme behave almost identically, so one
//! representative solve can stand in for all of them. Each step:
//!
//! 1. every worker proposes its first near-unreacted unit as a candidate;
//! 2. [`elect_global_reference`] gathers the candidates and picks the hottest
//!    as the run-wide reference;
//! 3. local units that [`ReferenceMapper::should_map`] accepts are resolved
//!    from one solve of the reference and never enter the balancer.
//!
//! [`map_step`] runs the whole pass. The [`ReferenceState`] is passed in and
//! returned explicitly; it never moves back to
//! [`ReferenceState::NoReferenceYet`] once a reference exists.

mod election;
mod error;
mod mapper;
mod mixture;
mod step;

pub use chembal_types::ReferenceState;
pub use election::{elect_global_reference, ReferenceCandidate};
pub use error::MappingError;
pub use mapper::{MapperConfig, ReferenceMapper};
pub use mixture::MixtureFraction;
pub use step::{map_step, MappingOutcome};
