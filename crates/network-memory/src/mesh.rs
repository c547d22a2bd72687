//! Full-mesh channel transport for thread-per-worker runs.

use crate::traffic::TrafficAnalyzer;
use chembal_network::{Transport, TransportError};
use chembal_types::WorkerId;
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use tracing::trace;

/// Builder for a set of connected [`MemoryTransport`]s.
///
/// Every ordered pair `(from, to)` gets its own unbounded channel, which gives
/// per-pair FIFO delivery and non-blocking sends. A worker whose transport is
/// dropped disconnects its outgoing channels, so peers waiting on it observe
/// [`TransportError::Disconnected`] instead of hanging.
pub struct MemoryNetwork {
    transports: Vec<MemoryTransport>,
    traffic: Arc<TrafficAnalyzer>,
}

impl MemoryNetwork {
    /// Wire up `size` workers.
    pub fn new(size: usize) -> Self {
        let traffic = Arc::new(TrafficAnalyzer::new(size));

        let mut outboxes: Vec<Vec<Sender<Vec<u8>>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut inboxes: Vec<Vec<Receiver<Vec<u8>>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();

        // Outer loop over senders so each inbox is filled in sender order.
        for outbox in outboxes.iter_mut() {
            for inbox in inboxes.iter_mut() {
                let (tx, rx) = unbounded();
                outbox.push(tx);
                inbox.push(rx);
            }
        }

        let transports = outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(index, (outboxes, inboxes))| MemoryTransport {
                local: WorkerId::from(index),
                outboxes,
                inboxes,
                traffic: Arc::clone(&traffic),
            })
            .collect();

        Self {
            transports,
            traffic,
        }
    }

    /// Number of workers in the mesh.
    pub fn size(&self) -> usize {
        self.transports.len()
    }

    /// Shared traffic counters, still readable after the transports are gone.
    pub fn traffic(&self) -> Arc<TrafficAnalyzer> {
        Arc::clone(&self.traffic)
    }

    /// Hand out one transport per worker, indexed by worker id.
    pub fn into_transports(self) -> Vec<MemoryTransport> {
        self.transports
    }
}

/// One worker's endpoint in a [`MemoryNetwork`].
pub struct MemoryTransport {
    local: WorkerId,
    /// `outboxes[to]` carries payloads from `local` to `to`.
    outboxes: Vec<Sender<Vec<u8>>>,
    /// `inboxes[from]` carries payloads from `from` to `local`.
    inboxes: Vec<Receiver<Vec<u8>>>,
    traffic: Arc<TrafficAnalyzer>,
}

impl MemoryTransport {
    fn unknown(&self, worker: WorkerId) -> TransportError {
        TransportError::UnknownWorker {
            worker,
            size: self.outboxes.len(),
        }
    }
}

impl Transport for MemoryTransport {
    fn local(&self) -> WorkerId {
        self.local
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, to: WorkerId, payload: Vec<u8>) -> Result<(), TransportError> {
        let outbox = self
            .outboxes
            .get(to.index())
            .ok_or_else(|| self.unknown(to))?;

        let bytes = payload.len();
        outbox
            .send(payload)
            .map_err(|_| TransportError::Disconnected(to))?;

        self.traffic.record(self.local, to, bytes);
        trace!(from = %self.local, %to, bytes, "payload queued");
        Ok(())
    }

    fn receive(&self, from: WorkerId) -> Result<Vec<u8>, TransportError> {
        let inbox = self
            .inboxes
            .get(from.index())
            .ok_or_else(|| self.unknown(from))?;

        inbox.recv().map_err(|_| TransportError::Disconnected(from))
    }
}
