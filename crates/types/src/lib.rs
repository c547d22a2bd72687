//! Core types for the chemistry load balancer.
//!
//! This crate provides the step-scoped records every other crate exchanges:
//!
//! - **Identifiers**: [`WorkerId`], [`CellId`]
//! - **Work records**: [`WorkUnit`] (one cell's integration task) and
//!   [`ResultUnit`] (its outcome)
//! - **Load**: [`LoadMetric`], one worker's aggregate solve cost
//! - **Reference mapping**: [`ReferenceState`]
//! - **Network traits**: the [`WireMessage`] marker for framed transport
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend on
//! any other workspace crates, making it the foundation layer.

mod identifiers;
mod load;
mod network;
mod reference;
mod work;

pub use identifiers::{CellId, WorkerId};
pub use load::LoadMetric;
pub use network::WireMessage;
pub use reference::ReferenceState;
pub use work::{ResultUnit, WorkUnit, WorkUnitError};
