//! Metrics facade for the chemistry load balancer.
//!
//! Provides a [`MetricsRecorder`] trait with domain-specific methods and default
//! no-op implementations. Convenience free functions delegate to the
//! thread's local recorder if one is set, else to the global singleton.
//! Backends live in their own crates (`chembal-metrics-memory`).
//!
//! # Usage
//!
//! Callers record metrics via free functions:
//! ```ignore
//! chembal_metrics::record_phase_latency("balance", latency_secs);
//! chembal_metrics::record_mapped_units(count);
//! ```
//!
//! At startup, a host may install a backend; without one every call is a no-op:
//! ```ignore
//! chembal_metrics::set_global_recorder(Box::new(MyRecorder::default()));
//! ```
//!
//! A thread can also record into its own backend for the duration of a
//! closure, overriding the global one. Worker threads of one in-process run
//! use this to share a recorder without touching other runs:
//! ```ignore
//! chembal_metrics::with_local_recorder(Arc::new(recorder.clone()), || run_worker());
//! ```

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

// ═══════════════════════════════════════════════════════════════════════
// Trait
// ═══════════════════════════════════════════════════════════════════════

/// Domain-specific metrics recording trait.
///
/// All methods have default no-op implementations so backends only need
/// to override the metrics they care about.
#[allow(unused_variables)]
pub trait MetricsRecorder: Send + Sync + 'static {
    // ── Step phases ──────────────────────────────────────────────────

    /// Record the wall time of one protocol phase
    /// (`get_problem`, `update_state`, `balance`, `solve_buffer`, `unbalance`).
    fn record_phase_latency(&self, phase: &str, latency_secs: f64) {}

    // ── Load balancing ───────────────────────────────────────────────

    /// Set this worker's load as reported to the gather.
    fn set_local_load(&self, cost: f64, units: usize) {}

    /// Record the max/mean ratio of the gathered load vector.
    fn record_load_imbalance(&self, max_over_mean: f64) {}

    /// Record the role this worker took in the current plan.
    fn record_plan_role(&self, role: &str) {}

    /// Record a plan rejected by validation.
    fn record_plan_validation_failure(&self) {}

    // ── Exchange ─────────────────────────────────────────────────────

    /// Record a buffer posted to a peer.
    fn record_units_sent(&self, phase: &str, units: usize, bytes: usize) {}

    /// Record a buffer received from a peer.
    fn record_units_received(&self, phase: &str, units: usize) {}

    // ── Reference mapping ────────────────────────────────────────────

    /// Record units resolved from the reference instead of being solved.
    fn record_mapped_units(&self, count: usize) {}

    /// Record the temperature of a newly elected reference.
    fn record_reference_elected(&self, temperature: f64) {}
}

// ═══════════════════════════════════════════════════════════════════════
// Global singleton
// ═══════════════════════════════════════════════════════════════════════

struct NoopRecorder;
impl MetricsRecorder for NoopRecorder {}

static RECORDER: OnceLock<Box<dyn MetricsRecorder>> = OnceLock::new();

/// Install a global metrics recorder.
///
/// Can only be called once. Subsequent calls are silently ignored.
pub fn set_global_recorder(recorder: Box<dyn MetricsRecorder>) {
    let _ = RECORDER.set(recorder);
}

/// Get the global metrics recorder.
///
/// Returns a no-op recorder if none has been installed.
#[inline]
fn global_recorder() -> &'static dyn MetricsRecorder {
    RECORDER.get().map(|r| r.as_ref()).unwrap_or(&NoopRecorder)
}

thread_local! {
    static LOCAL_RECORDER: RefCell<Option<Arc<dyn MetricsRecorder>>> = const { RefCell::new(None) };
}

/// Restores the previous thread-local recorder on drop, including on unwind.
struct LocalRecorderGuard(Option<Arc<dyn MetricsRecorder>>);

impl Drop for LocalRecorderGuard {
    fn drop(&mut self) {
        let previous = self.0.take();
        LOCAL_RECORDER.with(|local| *local.borrow_mut() = previous);
    }
}

/// Run `f` with `recorder` receiving every metric recorded on this thread.
///
/// Calls nest; the previous recorder is restored when `f` returns.
pub fn with_local_recorder<T>(recorder: Arc<dyn MetricsRecorder>, f: impl FnOnce() -> T) -> T {
    let previous = LOCAL_RECORDER.with(|local| local.borrow_mut().replace(recorder));
    let _guard = LocalRecorderGuard(previous);
    f()
}

/// Dispatch to this thread's recorder, or the global one.
#[inline]
fn recorder(f: impl FnOnce(&dyn MetricsRecorder)) {
    match LOCAL_RECORDER.with(|local| local.borrow().clone()) {
        Some(local) => f(local.as_ref()),
        None => f(global_recorder()),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Convenience free functions
// ═══════════════════════════════════════════════════════════════════════

// ── Step phases ──────────────────────────────────────────────────────

/// Record the wall time of one protocol phase.
#[inline]
pub fn record_phase_latency(phase: &str, latency_secs: f64) {
    recorder(|r| r.record_phase_latency(phase, latency_secs));
}

// ── Load balancing ───────────────────────────────────────────────────

/// Set this worker's load as reported to the gather.
#[inline]
pub fn set_local_load(cost: f64, units: usize) {
    recorder(|r| r.set_local_load(cost, units));
}

/// Record the max/mean ratio of the gathered load vector.
#[inline]
pub fn record_load_imbalance(max_over_mean: f64) {
    recorder(|r| r.record_load_imbalance(max_over_mean));
}

/// Record the role this worker took in the current plan.
#[inline]
pub fn record_plan_role(role: &str) {
    recorder(|r| r.record_plan_role(role));
}

/// Record a plan rejected by validation.
#[inline]
pub fn record_plan_validation_failure() {
    recorder(|r| r.record_plan_validation_failure());
}

// ── Exchange ─────────────────────────────────────────────────────────

/// Record a buffer posted to a peer.
#[inline]
pub fn record_units_sent(phase: &str, units: usize, bytes: usize) {
    recorder(|r| r.record_units_sent(phase, units, bytes));
}

/// Record a buffer received from a peer.
#[inline]
pub fn record_units_received(phase: &str, units: usize) {
    recorder(|r| r.record_units_received(phase, units));
}

// ── Reference mapping ────────────────────────────────────────────────

/// Record units resolved from the reference instead of being solved.
#[inline]
pub fn record_mapped_units(count: usize) {
    recorder(|r| r.record_mapped_units(count));
}

/// Record the temperature of a newly elected reference.
#[inline]
pub fn record_reference_elected(temperature: f64) {
    recorder(|r| r.record_reference_elected(temperature));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MappedCounter(AtomicUsize);

    impl MetricsRecorder for MappedCounter {
        fn record_mapped_units(&self, count: usize) {
            self.0.fetch_add(count, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_local_recorder_receives_calls() {
        let counter = Arc::new(MappedCounter::default());
        with_local_recorder(counter.clone(), || {
            record_mapped_units(3);
            record_mapped_units(4);
            record_phase_latency("balance", 0.5);
        });
        record_mapped_units(100);
        assert_eq!(counter.0.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn test_nested_recorders_restore_outer() {
        let outer = Arc::new(MappedCounter::default());
        let inner = Arc::new(MappedCounter::default());
        with_local_recorder(outer.clone(), || {
            record_mapped_units(1);
            with_local_recorder(inner.clone(), || record_mapped_units(10));
            record_mapped_units(2);
        });
        assert_eq!(outer.0.load(Ordering::Relaxed), 3);
        assert_eq!(inner.0.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_local_recorder_is_per_thread() {
        let counter = Arc::new(MappedCounter::default());
        with_local_recorder(counter.clone(), || {
            std::thread::spawn(|| record_mapped_units(5)).join().unwrap();
            record_mapped_units(1);
        });
        assert_eq!(counter.0.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_panic_restores_previous_recorder() {
        let counter = Arc::new(MappedCounter::default());
        let result = std::panic::catch_unwind(|| {
            with_local_recorder(counter.clone(), || panic!("worker failed"))
        });
        assert!(result.is_err());
        record_mapped_units(9);
        assert_eq!(counter.0.load(Ordering::Relaxed), 0);
    }
}
