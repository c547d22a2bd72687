//! Run statistics.

use chembal_balancer::load_imbalance;
use chembal_metrics_memory::MetricsSnapshot;
use chembal_model::PhaseTimings;
use chembal_network_memory::TrafficReport;
use chembal_types::{LoadMetric, WorkerId};
use std::time::Duration;

/// What one worker measured in one step.
#[derive(Debug, Clone, Default)]
pub struct WorkerStep {
    /// Cost of integrating all own units locally.
    pub own_cost: f64,
    /// Cost actually integrated here after mapping and balancing.
    pub solved_cost: f64,
    pub units: usize,
    pub mapped: usize,
    pub min_sub_step: f64,
    pub timings: PhaseTimings,
}

/// Cross-worker statistics of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepStats {
    pub step: usize,
    /// Max/mean cost if every worker solved its own units.
    pub imbalance_before: f64,
    /// Max/mean of the cost each worker actually integrated.
    pub imbalance_after: f64,
    pub units: usize,
    pub mapped: usize,
    pub min_sub_step: f64,
}

impl StepStats {
    /// Combine the per-worker records of one step, indexed by worker.
    pub fn from_workers(step: usize, workers: &[&WorkerStep]) -> Self {
        let loads = |cost: fn(&WorkerStep) -> f64| -> Vec<LoadMetric> {
            workers
                .iter()
                .enumerate()
                .map(|(i, w)| LoadMetric::new(WorkerId::from(i), cost(w), w.units))
                .collect()
        };

        Self {
            step,
            imbalance_before: load_imbalance(&loads(|w| w.own_cost)),
            imbalance_after: load_imbalance(&loads(|w| w.solved_cost)),
            units: workers.iter().map(|w| w.units).sum(),
            mapped: workers.iter().map(|w| w.mapped).sum(),
            min_sub_step: workers
                .iter()
                .map(|w| w.min_sub_step)
                .fold(f64::INFINITY, f64::min),
        }
    }
}

/// Summary of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub workers: usize,
    pub strategy: &'static str,
    pub steps: Vec<StepStats>,
    /// Phase times summed over all workers and steps.
    pub phase_totals: PhaseTimings,
    pub traffic: TrafficReport,
    /// Metrics recorded by all workers.
    pub metrics: MetricsSnapshot,
    pub elapsed: Duration,
}

impl SimulationReport {
    pub fn mean_imbalance_before(&self) -> f64 {
        mean(self.steps.iter().map(|s| s.imbalance_before))
    }

    pub fn mean_imbalance_after(&self) -> f64 {
        mean(self.steps.iter().map(|s| s.imbalance_after))
    }

    pub fn total_mapped(&self) -> usize {
        self.steps.iter().map(|s| s.mapped).sum()
    }

    /// Print a summary of the run.
    pub fn print_summary(&self) {
        println!();
        println!("======================= BALANCING ============================");
        println!("Workers:                {}", self.workers);
        println!("Strategy:               {}", self.strategy);
        println!("Steps:                  {}", self.steps.len());
        println!("Elapsed:                {:.3}s", self.elapsed.as_secs_f64());
        println!("Mean Imbalance Before:  {:.3}", self.mean_imbalance_before());
        println!("Mean Imbalance After:   {:.3}", self.mean_imbalance_after());
        println!("Mapped Units:           {}", self.total_mapped());
        println!();
        println!(
            "{:<6} {:>10} {:>10} {:>8} {:>8} {:>12}",
            "Step", "Before", "After", "Units", "Mapped", "Min dt"
        );
        println!("{}", "-".repeat(59));
        for step in &self.steps {
            println!(
                "{:<6} {:>10.3} {:>10.3} {:>8} {:>8} {:>12.3e}",
                step.step,
                step.imbalance_before,
                step.imbalance_after,
                step.units,
                step.mapped,
                step.min_sub_step,
            );
        }
        println!();
        println!("Phase Totals:");
        for (phase, duration) in self.phase_totals.phases() {
            println!("  {:<14} {:>10.6}s", phase, duration.as_secs_f64());
        }
        println!();
        self.metrics.print_summary();
        println!("================================================================");

        self.traffic.print_summary();
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        1.0
    } else {
        sum / count as f64
    }
}

/// Add `step`'s phase times into `totals`.
pub(crate) fn accumulate(totals: &mut PhaseTimings, step: &PhaseTimings) {
    totals.get_problem += step.get_problem;
    totals.update_state += step.update_state;
    totals.balance += step.balance;
    totals.solve_buffer += step.solve_buffer;
    totals.unbalance += step.unbalance;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(own_cost: f64, solved_cost: f64, mapped: usize, min_sub_step: f64) -> WorkerStep {
        WorkerStep {
            own_cost,
            solved_cost,
            units: 10,
            mapped,
            min_sub_step,
            timings: PhaseTimings::default(),
        }
    }

    #[test]
    fn test_step_stats() {
        let a = worker(9.0, 4.0, 2, 1e-6);
        let b = worker(1.0, 4.0, 0, 5e-7);
        let c = worker(2.0, 4.0, 1, f64::INFINITY);
        let stats = StepStats::from_workers(3, &[&a, &b, &c]);

        assert_eq!(stats.step, 3);
        assert_eq!(stats.imbalance_before, 9.0 / 4.0);
        assert_eq!(stats.imbalance_after, 1.0);
        assert_eq!(stats.units, 30);
        assert_eq!(stats.mapped, 3);
        assert_eq!(stats.min_sub_step, 5e-7);
    }

    #[test]
    fn test_accumulate_phases() {
        let mut totals = PhaseTimings::default();
        let step = PhaseTimings {
            balance: Duration::from_millis(2),
            ..Default::default()
        };
        accumulate(&mut totals, &step);
        accumulate(&mut totals, &step);
        assert_eq!(totals.balance, Duration::from_millis(4));
        assert_eq!(totals.total(), Duration::from_millis(4));
    }

    #[test]
    fn test_mean_of_nothing_is_balanced() {
        assert_eq!(mean(std::iter::empty()), 1.0);
        assert_eq!(mean([1.0, 3.0].into_iter()), 2.0);
    }
}
