//! Traffic accounting for in-memory runs.
//!
//! Every payload handed to a [`MemoryTransport`](crate::MemoryTransport) is
//! counted here by ordered worker pair. At the end of a run the simulator turns
//! the counters into a [`TrafficReport`] to show how much data balancing moved
//! and which pairs carried it.
//!
//! # Example
//!
//! ```ignore
//! let network = MemoryNetwork::new(4);
//! let traffic = network.traffic();
//! // ... run workers ...
//! traffic.report(elapsed).print_summary();
//! ```

use chembal_types::WorkerId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Message and byte counters for one ordered worker pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PairTraffic {
    pub messages: u64,
    pub bytes: u64,
}

/// Traffic counters shared by all transports of one mesh.
///
/// Totals are atomics so the common path stays cheap; the pair matrix sits
/// behind a single mutex.
#[derive(Debug)]
pub struct TrafficAnalyzer {
    size: usize,
    /// Row-major `size * size` matrix indexed by `from * size + to`.
    pairs: Mutex<Vec<PairTraffic>>,
    total_messages: AtomicU64,
    total_bytes: AtomicU64,
}

impl TrafficAnalyzer {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            pairs: Mutex::new(vec![PairTraffic::default(); size * size]),
            total_messages: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
        }
    }

    /// Count one payload of `bytes` sent from `from` to `to`.
    ///
    /// Pairs outside the mesh are counted in the totals only.
    pub fn record(&self, from: WorkerId, to: WorkerId, bytes: usize) {
        self.total_messages.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(bytes as u64, Ordering::Relaxed);

        if from.index() < self.size && to.index() < self.size {
            let mut pairs = self.pairs.lock();
            let pair = &mut pairs[from.index() * self.size + to.index()];
            pair.messages += 1;
            pair.bytes += bytes as u64;
        }
    }

    /// `(messages, bytes)` recorded so far.
    pub fn totals(&self) -> (u64, u64) {
        (
            self.total_messages.load(Ordering::Relaxed),
            self.total_bytes.load(Ordering::Relaxed),
        )
    }

    /// Counters for one ordered pair.
    pub fn pair(&self, from: WorkerId, to: WorkerId) -> PairTraffic {
        if from.index() >= self.size || to.index() >= self.size {
            return PairTraffic::default();
        }
        self.pairs.lock()[from.index() * self.size + to.index()]
    }

    /// Summarise the counters over a run of length `duration`.
    pub fn report(&self, duration: Duration) -> TrafficReport {
        let (total_messages, total_bytes) = self.totals();
        let pairs = self.pairs.lock().clone();

        let mut by_worker: Vec<WorkerTraffic> = (0..self.size)
            .map(|index| WorkerTraffic {
                worker: WorkerId::from(index),
                ..WorkerTraffic::default()
            })
            .collect();

        let mut busiest_pair = None;
        let mut busiest_bytes = 0;

        for (index, pair) in pairs.iter().enumerate() {
            if pair.messages == 0 {
                continue;
            }
            let (from, to) = (index / self.size, index % self.size);

            by_worker[from].messages_sent += pair.messages;
            by_worker[from].bytes_sent += pair.bytes;
            by_worker[to].messages_received += pair.messages;
            by_worker[to].bytes_received += pair.bytes;

            if pair.bytes > busiest_bytes {
                busiest_bytes = pair.bytes;
                busiest_pair = Some((WorkerId::from(from), WorkerId::from(to), *pair));
            }
        }

        TrafficReport {
            duration,
            total_messages,
            total_bytes,
            by_worker,
            busiest_pair,
        }
    }
}

/// Per-worker traffic totals.
#[derive(Debug, Default, Clone)]
pub struct WorkerTraffic {
    pub worker: WorkerId,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Traffic summary for a run.
#[derive(Debug, Clone)]
pub struct TrafficReport {
    pub duration: Duration,
    pub total_messages: u64,
    pub total_bytes: u64,
    /// Indexed by worker id.
    pub by_worker: Vec<WorkerTraffic>,
    /// Pair that carried the most bytes, if any traffic was recorded.
    pub busiest_pair: Option<(WorkerId, WorkerId, PairTraffic)>,
}

impl TrafficReport {
    /// Mean bytes per second across the whole mesh.
    pub fn bytes_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.total_bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// Print a summary of the traffic report.
    pub fn print_summary(&self) {
        println!();
        println!("===================== EXCHANGE TRAFFIC =======================");
        println!("Workers:                {}", self.by_worker.len());
        println!("Total Messages:         {}", self.total_messages);
        println!("Total Bytes:            {}", format_bytes(self.total_bytes));
        println!(
            "Throughput:             {}/s",
            format_bytes(self.bytes_per_sec() as u64)
        );
        if let Some((from, to, pair)) = self.busiest_pair {
            println!(
                "Busiest Pair:           {} -> {} ({} in {} messages)",
                from,
                to,
                format_bytes(pair.bytes),
                pair.messages
            );
        }
        println!();
        println!(
            "{:<8} {:>10} {:>12} {:>10} {:>12}",
            "Worker", "Sent", "Sent Bytes", "Recv", "Recv Bytes"
        );
        println!("{}", "-".repeat(56));
        for worker in &self.by_worker {
            println!(
                "{:<8} {:>10} {:>12} {:>10} {:>12}",
                worker.worker,
                worker.messages_sent,
                format_bytes(worker.bytes_sent),
                worker.messages_received,
                format_bytes(worker.bytes_received),
            );
        }
        println!("================================================================");
    }
}

/// Format bytes into a human-readable string.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1_000;
    const MB: u64 = 1_000_000;
    const GB: u64 = 1_000_000_000;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_pairs_and_totals() {
        let analyzer = TrafficAnalyzer::new(3);
        analyzer.record(WorkerId(0), WorkerId(1), 100);
        analyzer.record(WorkerId(0), WorkerId(1), 50);
        analyzer.record(WorkerId(2), WorkerId(0), 10);

        assert_eq!(analyzer.totals(), (3, 160));
        assert_eq!(
            analyzer.pair(WorkerId(0), WorkerId(1)),
            PairTraffic {
                messages: 2,
                bytes: 150
            }
        );
        assert_eq!(analyzer.pair(WorkerId(1), WorkerId(0)), PairTraffic::default());
    }

    #[test]
    fn test_report_per_worker() {
        let analyzer = TrafficAnalyzer::new(3);
        analyzer.record(WorkerId(0), WorkerId(1), 100);
        analyzer.record(WorkerId(2), WorkerId(1), 300);

        let report = analyzer.report(Duration::from_secs(2));
        assert_eq!(report.total_bytes, 400);
        assert_eq!(report.by_worker[1].messages_received, 2);
        assert_eq!(report.by_worker[1].bytes_received, 400);
        assert_eq!(report.by_worker[2].bytes_sent, 300);
        assert_eq!(report.bytes_per_sec(), 200.0);

        let (from, to, pair) = report.busiest_pair.unwrap();
        assert_eq!((from, to), (WorkerId(2), WorkerId(1)));
        assert_eq!(pair.bytes, 300);
    }

    #[test]
    fn test_out_of_range_counts_totals_only() {
        let analyzer = TrafficAnalyzer::new(2);
        analyzer.record(WorkerId(0), WorkerId(7), 5);
        assert_eq!(analyzer.totals(), (1, 5));
        assert!(analyzer.report(Duration::ZERO).busiest_pair.is_none());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1500), "1.50 KB");
        assert_eq!(format_bytes(1_500_000), "1.50 MB");
        assert_eq!(format_bytes(1_500_000_000), "1.50 GB");
    }
}
