//! Multi-worker chemistry steps over an in-memory mesh.

use chembal_balancer::Role;
use chembal_mapping::{MapperConfig, MixtureFraction};
use chembal_model::{
    BalancedChemistryModel, CellState, ChemistrySolver, CostMeasurement, HostChemistry,
    Integration, ModelConfig, ReactionRates, TIMING_LOG_HEADER,
};
use chembal_network::Transport;
use chembal_test_helpers::run_workers;
use chembal_types::{CellId, WorkUnit, WorkerId};
use std::fs;

const MOLAR_MASSES: [f64; 3] = [2.0, 32.0, 18.0];
const FLOW_DT: f64 = 1e-5;

/// Every species decays by 10% over the flow step.
struct DecaySolver;

impl ChemistrySolver for DecaySolver {
    fn integrate(&self, unit: &WorkUnit) -> Integration {
        Integration {
            final_concentrations: unit.concentrations.iter().map(|c| c * 0.9).collect(),
            chem_sub_step: 1e-9 * unit.temperature,
            cost: unit.temperature / 1000.0,
        }
    }
}

fn host() -> HostChemistry {
    HostChemistry::new(MOLAR_MASSES.to_vec(), 500.0)
}

fn cell(temperature: f64, fuel: f64) -> CellState {
    CellState {
        temperature,
        pressure: 101_325.0,
        density: 1.2,
        mass_fractions: vec![fuel, 0.2, 0.8 - fuel],
        chem_sub_step: 1e-7,
        cost: 1.0,
    }
}

/// Worker 3 holds most of the hot cells; every worker has one cold cell.
fn cells_for(worker: WorkerId) -> Vec<CellState> {
    let hot = if worker == WorkerId(3) { 40 } else { 4 };
    let mut cells: Vec<CellState> = (0..hot)
        .map(|i| cell(1200.0 + 10.0 * i as f64 + worker.0 as f64, 0.1))
        .collect();
    cells.insert(1, cell(300.0, 0.1));
    cells
}

fn expected_rates(host: &HostChemistry, state: &CellState) -> Vec<f64> {
    let c = host
        .concentrations(state.density, &state.mass_fractions)
        .unwrap();
    c.iter()
        .zip(&host.molar_masses)
        .map(|(c, w)| (0.9 * c - c) / FLOW_DT * w)
        .collect()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() <= 1e-9 * e.abs().max(1.0), "{a} != {e}");
    }
}

#[test]
fn test_balanced_step_matches_local_solve() {
    let outcomes = run_workers(4, |transport| {
        let me = transport.local();
        let host = host();
        let cells = cells_for(me);
        let config = ModelConfig::new().with_cost_measurement(CostMeasurement::Reported);
        let mut model = BalancedChemistryModel::new(transport, DecaySolver, config).unwrap();

        let mut rates = ReactionRates::new(cells.len(), host.molar_masses.clone(), 1.0);
        let units = host.collect_work_units(&cells, FLOW_DT, &mut rates).unwrap();
        let min_sub_step = model.solve(0.0, units, &mut rates).unwrap();

        (me, cells, rates, min_sub_step, model.plan().clone())
    });

    let plan = &outcomes[0].4;
    assert!(matches!(plan.role(WorkerId(3)), Some(Role::Sender { .. })));

    let host = host();
    for (me, cells, rates, min_sub_step, worker_plan) in &outcomes {
        assert_eq!(worker_plan, plan);

        for (index, state) in cells.iter().enumerate() {
            let id = CellId(index as u64);
            if state.temperature <= host.reaction_temperature {
                assert_eq!(rates.rates(id), Some(&[0.0; 3][..]));
                continue;
            }
            assert_close(rates.rates(id).unwrap(), &expected_rates(&host, state));
            assert_eq!(rates.cost(id), Some(state.temperature / 1000.0));
        }

        // The coolest hot cell is the first one.
        assert_eq!(*min_sub_step, 1e-9 * (1200.0 + me.0 as f64));
    }
}

#[test]
fn test_mapping_and_timing_logs_across_workers() {
    let dir = tempfile::tempdir().unwrap();
    let mixture = MixtureFraction::new(vec![1.0, 0.0, 0.0], 0.0, 1.0).unwrap();
    let mapper = MapperConfig::new()
        .with_enabled(true)
        .with_tolerance(1e-6)
        .with_temperature_tolerance(50.0);

    let outcomes = run_workers(3, |transport| {
        let me = transport.local();
        let host = host();
        // Worker 1 holds pure-oxidiser cells; the rest carry fuel.
        let fuel = if me == WorkerId(1) { 0.0 } else { 0.1 };
        let cells: Vec<CellState> = (0..6)
            .map(|i| cell(900.0 + 5.0 * i as f64, fuel))
            .collect();

        let config = ModelConfig::new()
            .with_cost_measurement(CostMeasurement::Reported)
            .with_mapping(mapper.clone(), mixture.clone())
            .with_timing_log_dir(dir.path());
        let mut model = BalancedChemistryModel::new(transport, DecaySolver, config).unwrap();

        let mut rates = ReactionRates::new(cells.len(), host.molar_masses.clone(), 1.0);
        let mut sub_steps = Vec::new();
        for step in 0..2 {
            let units = host.collect_work_units(&cells, FLOW_DT, &mut rates).unwrap();
            let time = step as f64 * FLOW_DT;
            sub_steps.push(model.solve_uniform(time, units, FLOW_DT, &mut rates).unwrap());
        }

        let reference = model.reference_state().reference().cloned();
        (cells, rates, reference, sub_steps)
    });

    // Every worker agrees on the reference, which came from worker 1.
    let reference = outcomes[0].2.clone().expect("reference elected");
    assert_eq!(reference.cell, CellId(0));
    assert_eq!(reference.temperature, 900.0);
    for (_, _, worker_reference, sub_steps) in &outcomes {
        assert_eq!(worker_reference.as_ref(), Some(&reference));
        assert!(sub_steps.iter().all(|&dt| dt <= 2.0 * FLOW_DT));
    }

    // Mapped cells on worker 1 carry the reference's rates.
    let host = host();
    let (cells, rates, _, _) = &outcomes[1];
    let reference_rates = expected_rates(&host, &cells[0]);
    for index in 0..cells.len() {
        assert_close(rates.rates(CellId(index as u64)).unwrap(), &reference_rates);
    }

    for worker in 0..3 {
        let contents = fs::read_to_string(dir.path().join(format!("cpu_solve_{worker}.out"))).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TIMING_LOG_HEADER);
        for line in &lines[1..] {
            let columns: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(columns.len(), 7);
            assert_eq!(columns[6], worker.to_string());
        }
    }
}
