//! Single-worker communicator.

use chembal_network::{Transport, TransportError};
use chembal_types::WorkerId;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A communicator of size one.
///
/// Collective and pairwise exchanges short-circuit before reaching the
/// transport when only one worker participates, so this type mostly exists to
/// give the serial path a concrete [`Transport`]. Payloads sent to worker 0 are
/// queued and handed back by `receive(0)`. Receiving from an empty queue
/// reports [`TransportError::Disconnected`] since nothing could ever fill it.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    queue: Mutex<VecDeque<Vec<u8>>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, worker: WorkerId) -> Result<(), TransportError> {
        if worker != WorkerId(0) {
            return Err(TransportError::UnknownWorker { worker, size: 1 });
        }
        Ok(())
    }
}

impl Transport for LoopbackTransport {
    fn local(&self) -> WorkerId {
        WorkerId(0)
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, to: WorkerId, payload: Vec<u8>) -> Result<(), TransportError> {
        self.check(to)?;
        self.queue.lock().push_back(payload);
        Ok(())
    }

    fn receive(&self, from: WorkerId) -> Result<Vec<u8>, TransportError> {
        self.check(from)?;
        self.queue
            .lock()
            .pop_front()
            .ok_or(TransportError::Disconnected(from))
    }
}
