//! In-memory metrics backend.
//!
//! Implements [`chembal_metrics::MetricsRecorder`] by accumulating totals
//! behind a mutex. Clones share the same totals, so one recorder can collect
//! from every worker thread of a run.
//!
//! # Usage
//!
//! Install globally once at startup:
//! ```ignore
//! let recorder = chembal_metrics_memory::install();
//! // ... run ...
//! println!("{:?}", recorder.snapshot());
//! ```
//!
//! Or scope it to a thread with [`chembal_metrics::with_local_recorder`].

use chembal_metrics::MetricsRecorder;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Totals recorded so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Seconds spent per protocol phase.
    pub phase_secs: BTreeMap<String, f64>,
    /// Number of loads reported to the gather.
    pub load_reports: usize,
    /// Units summed over all reported loads.
    pub reported_units: usize,
    /// Largest max/mean ratio seen.
    pub max_imbalance: f64,
    /// How often each plan role was taken.
    pub roles: BTreeMap<String, usize>,
    pub validation_failures: usize,
    /// Units posted to peers, per phase.
    pub units_sent: BTreeMap<String, usize>,
    /// Encoded bytes posted to peers.
    pub bytes_sent: usize,
    /// Units received from peers, per phase.
    pub units_received: BTreeMap<String, usize>,
    pub mapped_units: usize,
    pub references_elected: usize,
}

impl MetricsSnapshot {
    pub fn role_count(&self, role: &str) -> usize {
        self.roles.get(role).copied().unwrap_or(0)
    }

    pub fn sent(&self, phase: &str) -> usize {
        self.units_sent.get(phase).copied().unwrap_or(0)
    }

    pub fn received(&self, phase: &str) -> usize {
        self.units_received.get(phase).copied().unwrap_or(0)
    }

    /// Print the totals.
    pub fn print_summary(&self) {
        println!("Metrics:");
        println!("  Load Reports:         {}", self.load_reports);
        println!("  Max Imbalance:        {:.3}", self.max_imbalance);
        for (role, count) in &self.roles {
            println!("  Role {:<16} {}", format!("{role}:"), count);
        }
        for (phase, units) in &self.units_sent {
            println!("  Units Sent {:<11} {}", format!("({phase}):"), units);
        }
        println!("  Bytes Sent:           {}", self.bytes_sent);
        println!("  Mapped Units:         {}", self.mapped_units);
        println!("  References Elected:   {}", self.references_elected);
        if self.validation_failures > 0 {
            println!("  Rejected Plans:       {}", self.validation_failures);
        }
    }
}

/// Recorder accumulating [`MetricsSnapshot`] totals.
#[derive(Debug, Clone, Default)]
pub struct CountingRecorder {
    totals: Arc<Mutex<MetricsSnapshot>>,
}

impl CountingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current totals.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.totals.lock().clone()
    }

    /// Shared handle for [`chembal_metrics::with_local_recorder`].
    pub fn handle(&self) -> Arc<dyn MetricsRecorder> {
        Arc::new(self.clone())
    }
}

impl MetricsRecorder for CountingRecorder {
    fn record_phase_latency(&self, phase: &str, latency_secs: f64) {
        *self
            .totals
            .lock()
            .phase_secs
            .entry(phase.to_string())
            .or_default() += latency_secs;
    }

    fn set_local_load(&self, _cost: f64, units: usize) {
        let mut totals = self.totals.lock();
        totals.load_reports += 1;
        totals.reported_units += units;
    }

    fn record_load_imbalance(&self, max_over_mean: f64) {
        let mut totals = self.totals.lock();
        totals.max_imbalance = totals.max_imbalance.max(max_over_mean);
    }

    fn record_plan_role(&self, role: &str) {
        *self.totals.lock().roles.entry(role.to_string()).or_default() += 1;
    }

    fn record_plan_validation_failure(&self) {
        self.totals.lock().validation_failures += 1;
    }

    fn record_units_sent(&self, phase: &str, units: usize, bytes: usize) {
        let mut totals = self.totals.lock();
        *totals.units_sent.entry(phase.to_string()).or_default() += units;
        totals.bytes_sent += bytes;
    }

    fn record_units_received(&self, phase: &str, units: usize) {
        *self
            .totals
            .lock()
            .units_received
            .entry(phase.to_string())
            .or_default() += units;
    }

    fn record_mapped_units(&self, count: usize) {
        self.totals.lock().mapped_units += count;
    }

    fn record_reference_elected(&self, _temperature: f64) {
        self.totals.lock().references_elected += 1;
    }
}

/// Install a fresh counting recorder as the global backend and return a
/// handle to read it.
///
/// Only the first installation in a process takes effect.
pub fn install() -> CountingRecorder {
    let recorder = CountingRecorder::new();
    chembal_metrics::set_global_recorder(Box::new(recorder.clone()));
    recorder
}
