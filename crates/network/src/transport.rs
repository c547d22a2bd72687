//! Transport trait for point-to-point byte delivery.
//!
//! Defines the `Transport` interface implemented by the in-memory mesh and the
//! single-process loopback in `chembal-network-memory`. Everything above this
//! trait (gather, exchange, reference election) is transport-agnostic.

use chembal_types::WorkerId;

/// Error returned when a transport operation fails.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Unknown worker {worker} (communicator size {size})")]
    UnknownWorker { worker: WorkerId, size: usize },
    #[error("Peer disconnected: {0}")]
    Disconnected(WorkerId),
}

/// Ordered, reliable byte delivery between a fixed set of workers.
///
/// # Contract
///
/// - `send` never waits for the receiver; payloads are buffered by the
///   transport until the peer asks for them.
/// - `receive(from)` blocks until the next payload from `from` arrives.
/// - Payloads between one ordered pair of workers are delivered in the order
///   they were sent (per-pair FIFO). No ordering holds across pairs.
///
/// There is no timeout: a receive that never completes is a protocol bug.
pub trait Transport: Send + Sync {
    /// Identity of the calling worker.
    fn local(&self) -> WorkerId;

    /// Number of workers in the communicator.
    fn size(&self) -> usize;

    /// Queue `payload` for delivery to `to`.
    fn send(&self, to: WorkerId, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Block until the next payload from `from` arrives.
    fn receive(&self, from: WorkerId) -> Result<Vec<u8>, TransportError>;

    /// Whether more than one worker participates.
    fn is_parallel(&self) -> bool {
        self.size() > 1
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn local(&self) -> WorkerId {
        (**self).local()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn send(&self, to: WorkerId, payload: Vec<u8>) -> Result<(), TransportError> {
        (**self).send(to, payload)
    }

    fn receive(&self, from: WorkerId) -> Result<Vec<u8>, TransportError> {
        (**self).receive(from)
    }
}
