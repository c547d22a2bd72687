//! End-to-end simulator runs.

use chembal_balancer::StrategyKind;
use chembal_model::TIMING_LOG_HEADER;
use chembal_simulator::{HeavyPattern, Simulator, SimulatorConfig};
use std::fs;

fn skewed(workers: usize) -> SimulatorConfig {
    SimulatorConfig::new(workers, 200)
        .with_steps(3)
        .with_seed(11)
        .with_heavy(HeavyPattern::new(4, 0.5))
}

#[test]
fn test_balancing_reduces_imbalance() {
    for strategy in StrategyKind::ALL {
        let report = Simulator::new(skewed(4).with_strategy(strategy))
            .unwrap()
            .run()
            .unwrap();

        // The first step has no measured costs yet, so nothing moves.
        let first = &report.steps[0];
        assert_eq!(first.imbalance_before, first.imbalance_after);
        assert!(first.imbalance_before > 3.0, "{strategy}: {first:?}");

        for step in &report.steps[1..] {
            assert!(
                step.imbalance_after < step.imbalance_before,
                "{strategy}: {step:?}"
            );
        }
        assert!(report.traffic.total_messages > 0);
        assert_eq!(report.strategy, strategy.as_str());

        // Every unit balanced away comes back as a result.
        let metrics = &report.metrics;
        assert!(metrics.sent("balance") > 0);
        assert_eq!(metrics.sent("balance"), metrics.received("balance"));
        assert_eq!(metrics.sent("balance"), metrics.sent("unbalance"));
        assert_eq!(metrics.load_reports, 4 * report.steps.len());
        assert!(metrics.role_count("sender") > 0);
        let roles: usize = metrics.roles.values().sum();
        assert_eq!(roles, 4 * report.steps.len());
    }
}

#[test]
fn test_runs_are_reproducible() {
    let a = Simulator::new(skewed(3)).unwrap().run().unwrap();
    let b = Simulator::new(skewed(3)).unwrap().run().unwrap();
    assert_eq!(a.steps, b.steps);
}

#[test]
fn test_mapping_resolves_light_cells() {
    let config = skewed(4).with_steps(1).with_mapping(true);
    let report = Simulator::new(config).unwrap().run().unwrap();

    // Worker 0 has 100 light cells, the others 200 each.
    assert_eq!(report.steps[0].mapped, 700);
    assert_eq!(report.total_mapped(), 700);
}

#[test]
fn test_mapping_holds_after_heavy_cells_burn() {
    let config = skewed(4).with_steps(5).with_mapping(true);
    let report = Simulator::new(config).unwrap().run().unwrap();

    let mapped: Vec<usize> = report.steps.iter().map(|s| s.mapped).collect();
    assert_eq!(mapped, vec![700; 5]);
    assert_eq!(report.total_mapped(), 3500);
    assert_eq!(report.metrics.mapped_units, 3500);
    // Every worker adopts the elected reference every step.
    assert_eq!(report.metrics.references_elected, 4 * 5);
}

#[test]
fn test_timing_logs_per_worker() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("timing");
    let config = skewed(2).with_log_dir(&logs);
    Simulator::new(config).unwrap().run().unwrap();

    for worker in 0..2 {
        let contents = fs::read_to_string(logs.join(format!("cpu_solve_{worker}.out"))).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], TIMING_LOG_HEADER);
        assert_eq!(lines.len(), 4);
    }
}
