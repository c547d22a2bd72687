//! Multi-worker balancing tests.
//!
//! Each test runs one thread per worker over an in-memory mesh and drives the
//! full step: gather loads, plan, balance work, solve, unbalance results.

use chembal_balancer::{merge, BalancerConfig, LoadBalancer, RedistributionPlan, Role, StrategyKind};
use chembal_network::Transport;
use chembal_network_memory::MemoryTransport;
use chembal_test_helpers::fixtures::{owner_of, random_units, tagged_result, units_for_worker};
use chembal_test_helpers::{run_workers, run_workers_with_traffic};
use chembal_metrics_memory::CountingRecorder;
use chembal_types::{ResultUnit, WorkUnit, WorkerId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// What one worker observed during a step.
struct StepOutcome {
    plan: RedistributionPlan,
    received: usize,
    solved_cells: Vec<u64>,
    local: Vec<WorkUnit>,
    results: Vec<ResultUnit>,
}

/// Run one full balancing step on this worker.
fn step(transport: MemoryTransport, config: BalancerConfig, local: Vec<WorkUnit>) -> StepOutcome {
    let mut balancer = LoadBalancer::new(transport, config);
    balancer.update_state(&local).unwrap();

    let flat = merge(balancer.balance(local.clone()).unwrap());
    let received = flat.len();
    let solved_cells = flat.iter().map(|u| u.cell.0).collect();

    let results: Vec<ResultUnit> = flat.iter().map(tagged_result).collect();
    let returned = merge(balancer.unbalance(results).unwrap());

    StepOutcome {
        plan: balancer.plan().clone(),
        received,
        solved_cells,
        local,
        results: returned,
    }
}

fn assert_results_routed_home(outcome: &StepOutcome, me: WorkerId) {
    assert_eq!(outcome.results.len(), outcome.local.len());
    for (unit, result) in outcome.local.iter().zip(&outcome.results) {
        assert_eq!(result.cell, unit.cell);
        assert_eq!(owner_of(result.cell), me);
        assert_eq!(result.increments, vec![unit.cell.0 as f64]);
    }
}

#[test]
fn test_four_worker_scenario() {
    let unit_counts = [10, 10, 10, 70];

    let outcomes = run_workers(4, |transport| {
        let me = transport.local();
        let local = units_for_worker(me, unit_counts[me.index()], 1.0);
        step(transport, BalancerConfig::default(), local)
    });

    let received: Vec<usize> = outcomes.iter().map(|o| o.received).collect();
    assert_eq!(received, vec![25, 10, 10, 55]);
    assert_eq!(received.iter().sum::<usize>(), 100);

    let plan = &outcomes[0].plan;
    assert!(matches!(plan.role(WorkerId(3)), Some(Role::Sender { .. })));
    assert!(matches!(plan.role(WorkerId(0)), Some(Role::Receiver { .. })));

    // Worker 0 solved 15 of worker 3's cells.
    let foreign = outcomes[0]
        .solved_cells
        .iter()
        .filter(|&&cell| owner_of(chembal_types::CellId(cell)) == WorkerId(3))
        .count();
    assert_eq!(foreign, 15);

    for (i, outcome) in outcomes.iter().enumerate() {
        assert_eq!(&outcome.plan, plan);
        assert_results_routed_home(outcome, WorkerId::from(i));
    }
}

#[test]
fn test_step_reports_roles_and_transfers() {
    let unit_counts = [10, 10, 10, 70];

    let totals = run_workers(4, |transport| {
        let me = transport.local();
        let recorder = CountingRecorder::new();
        let local = units_for_worker(me, unit_counts[me.index()], 1.0);
        chembal_metrics::with_local_recorder(recorder.handle(), || {
            step(transport, BalancerConfig::default(), local)
        });
        recorder.snapshot()
    });

    let roles: Vec<&str> = totals
        .iter()
        .map(|t| {
            assert_eq!(t.roles.len(), 1);
            t.roles.keys().next().unwrap().as_str()
        })
        .collect();
    assert_eq!(roles, vec!["receiver", "inactive", "inactive", "sender"]);

    for (t, &units) in totals.iter().zip(&unit_counts) {
        assert_eq!(t.load_reports, 1);
        assert_eq!(t.reported_units, units);
        assert_eq!(t.max_imbalance, 70.0 / 25.0);
    }

    // Worker 3 forwards 15 units to worker 0, which returns 15 results.
    assert_eq!(totals[3].sent("balance"), 15);
    assert_eq!(totals[0].received("balance"), 15);
    assert_eq!(totals[0].sent("unbalance"), 15);
    assert_eq!(totals[3].received("unbalance"), 15);
    for inactive in &totals[1..3] {
        assert!(inactive.units_sent.is_empty());
        assert!(inactive.units_received.is_empty());
        assert_eq!(inactive.bytes_sent, 0);
    }
}

#[test]
fn test_equal_loads_move_nothing() {
    let (outcomes, traffic) = run_workers_with_traffic(4, |transport| {
        let local = units_for_worker(transport.local(), 12, 2.0);
        step(transport, BalancerConfig::default(), local)
    });

    for outcome in &outcomes {
        assert!(outcome.plan.is_identity());
        assert_eq!(outcome.received, 12);
    }

    // Only the load gather touched the mesh.
    let (messages, _) = traffic.totals();
    assert_eq!(messages, 4 * 3);
}

#[test]
fn test_conservation_and_routing_randomised() {
    for strategy in [StrategyKind::MinMaxPair, StrategyKind::Greedy] {
        for seed in 0..8u64 {
            let workers = 2 + (seed as usize % 5);
            let config = BalancerConfig::default().with_strategy(strategy);

            let outcomes = run_workers(workers, |transport| {
                let me = transport.local();
                let mut rng = ChaCha8Rng::seed_from_u64(seed * 100 + me.0 as u64);
                let local = random_units(&mut rng, me, 60);
                step(transport, config.clone(), local)
            });

            let before: usize = outcomes.iter().map(|o| o.local.len()).sum();
            let after: usize = outcomes.iter().map(|o| o.received).sum();
            assert_eq!(before, after, "{strategy} seed {seed}: units lost");

            let plan = &outcomes[0].plan;
            plan.validate().unwrap();
            for (i, outcome) in outcomes.iter().enumerate() {
                assert_eq!(&outcome.plan, plan, "{strategy} seed {seed}: plans differ");
                assert_eq!(outcome.received, plan.units_after()[i]);
                assert_results_routed_home(outcome, WorkerId::from(i));
            }
        }
    }
}

#[test]
fn test_plan_symmetry_across_workers() {
    let outcomes = run_workers(6, |transport| {
        let me = transport.local();
        let local = units_for_worker(me, 5 + 10 * me.index(), 1.5);
        step(transport, BalancerConfig::default().with_strategy(StrategyKind::Greedy), local)
    });

    let plan = &outcomes[0].plan;
    for transfer in plan.transfers() {
        let Some(Role::Receiver { sources, counts }) = plan.role(transfer.to) else {
            panic!("worker {} is not a receiver", transfer.to);
        };
        let position = sources.iter().position(|&s| s == transfer.from).unwrap();
        assert_eq!(counts[position], transfer.count);
    }
}

#[test]
fn test_balancing_over_several_steps_converges() {
    let unit_counts = [4, 4, 4, 100];

    let imbalance = run_workers(4, |transport| {
        let me = transport.local();
        let mut balancer = LoadBalancer::new(transport, BalancerConfig::default());
        let mut local = units_for_worker(me, unit_counts[me.index()], 1.0);
        let mut ratios = Vec::new();

        // Adopt the received units as this worker's own for the next step.
        for _ in 0..6 {
            let loads = balancer.update_state(&local).unwrap();
            ratios.push(chembal_balancer::load_imbalance(&loads));
            local = merge(balancer.balance(local).unwrap());
        }
        ratios
    });

    let ratios = &imbalance[0];
    assert!(ratios.windows(2).all(|w| w[1] <= w[0]));
    assert!(ratios.last().unwrap() < ratios.first().unwrap());
}
