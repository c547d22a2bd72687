//! Test helpers for the chemistry load balancer.
//!
//! Provides work-unit fixtures and [`run_workers`], which runs one closure per
//! worker on its own thread over a fresh [`MemoryNetwork`], the way a real run
//! has one process per rank.
//!
//! # Example
//!
//! ```rust
//! use chembal_network_memory::MemoryTransport;
//! use chembal_test_helpers::run_workers;
//!
//! let ids = run_workers(3, |transport: MemoryTransport| {
//!     use chembal_network::Transport;
//!     transport.local().0
//! });
//! assert_eq!(ids, vec![0, 1, 2]);
//! ```

pub mod fixtures;

use chembal_network_memory::{MemoryNetwork, MemoryTransport, TrafficAnalyzer};
use std::panic;
use std::sync::Arc;
use std::thread;

/// Run `worker` once per worker, each on its own thread, and collect the
/// results in worker-id order.
///
/// A panicking worker drops its transport, so peers blocked on it fail with a
/// disconnect instead of hanging; the first panic is then re-raised here.
pub fn run_workers<F, R>(size: usize, worker: F) -> Vec<R>
where
    F: Fn(MemoryTransport) -> R + Sync,
    R: Send,
{
    run_workers_with_traffic(size, worker).0
}

/// Like [`run_workers`], also returning the mesh's traffic counters.
pub fn run_workers_with_traffic<F, R>(size: usize, worker: F) -> (Vec<R>, Arc<TrafficAnalyzer>)
where
    F: Fn(MemoryTransport) -> R + Sync,
    R: Send,
{
    let network = MemoryNetwork::new(size);
    let traffic = network.traffic();
    let worker = &worker;

    let results = thread::scope(|scope| {
        let handles: Vec<_> = network
            .into_transports()
            .into_iter()
            .map(|transport| scope.spawn(move || worker(transport)))
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    });

    (results, traffic)
}
