//! In-process transports.
//!
//! [`MemoryNetwork`] wires `n` workers into a full mesh of unbounded channels,
//! one per ordered pair, so each worker can run on its own thread and exchange
//! buffers exactly as it would over a real communicator.
//!
//! [`LoopbackTransport`] is the single-worker communicator used when the
//! solver runs serially.
//!
//! [`TrafficAnalyzer`] tracks per-pair and per-worker byte counts for the
//! simulator report.

mod loopback;
mod mesh;
mod traffic;

pub use loopback::LoopbackTransport;
pub use mesh::{MemoryNetwork, MemoryTransport};
pub use traffic::{PairTraffic, TrafficAnalyzer, TrafficReport, WorkerTraffic};
