//! Reference election across several workers.

use chembal_mapping::{
    elect_global_reference, map_step, MapperConfig, MappingError, MixtureFraction, ReferenceMapper,
};
use chembal_network::Transport;
use chembal_test_helpers::fixtures::{tagged_result, unit_with_state, CELL_STRIDE};
use chembal_test_helpers::run_workers;
use chembal_types::{ReferenceState, ResultUnit, WorkUnit};

fn solve_tagged(unit: &WorkUnit) -> Result<ResultUnit, MappingError> {
    Ok(tagged_result(unit))
}

fn mapper() -> ReferenceMapper {
    ReferenceMapper::new(
        MapperConfig::new()
            .with_enabled(true)
            .with_tolerance(0.05)
            .with_temperature_tolerance(50.0),
        MixtureFraction::new(vec![1.0, 0.0], 0.0, 1.0).unwrap(),
    )
}

/// Worker `w` owns one unreacted unit at `temperatures[w]` (if any) and one
/// reacted unit.
fn local_units(worker: u32, temperature: Option<f64>) -> Vec<WorkUnit> {
    let base = worker as u64 * CELL_STRIDE;
    let mut units = vec![unit_with_state(base, vec![0.8, 0.2], 2100.0)];
    if let Some(t) = temperature {
        units.push(unit_with_state(base + 1, vec![0.0, 1.0], t));
    }
    units
}

#[test]
fn test_hottest_candidate_wins_everywhere() {
    let temperatures = [Some(700.0), None, Some(760.0), Some(760.0)];

    let states = run_workers(4, |transport| {
        let me = transport.local();
        let units = local_units(me.0, temperatures[me.index()]);
        let candidate = mapper().candidate(&units).cloned();
        elect_global_reference(&transport, candidate.as_ref(), ReferenceState::NoReferenceYet)
            .unwrap()
    });

    // Tie between workers 2 and 3 goes to worker 2.
    let expected = 2 * CELL_STRIDE + 1;
    for state in &states {
        assert_eq!(state.reference().map(|u| u.cell.0), Some(expected));
    }
}

#[test]
fn test_reference_survives_steps_without_candidates() {
    let states = run_workers(3, |transport| {
        let me = transport.local();
        let mapper = mapper();
        let mut state = ReferenceState::NoReferenceYet;
        let mut history = Vec::new();

        // Only the first step has an unreacted unit, on worker 1.
        for step in 0..4 {
            let temperature = (step == 0 && me.0 == 1).then_some(650.0);
            let units = local_units(me.0, temperature);
            let outcome = map_step(&mapper, &transport, units, state, solve_tagged).unwrap();
            state = outcome.state;
            history.push(state.is_established());
        }
        (history, state)
    });

    for (history, state) in &states {
        assert_eq!(history, &vec![true; 4]);
        assert_eq!(state.reference().map(|u| u.temperature), Some(650.0));
    }
}

#[test]
fn test_mapped_units_stay_home() {
    let outcomes = run_workers(2, |transport| {
        let me = transport.local();
        let units = local_units(me.0, Some(600.0 + 10.0 * me.0 as f64));
        map_step(&mapper(), &transport, units, ReferenceState::NoReferenceYet, solve_tagged)
            .unwrap()
    });

    for (worker, outcome) in outcomes.iter().enumerate() {
        let base = worker as u64 * CELL_STRIDE;
        assert_eq!(outcome.mapped.len(), 1);
        assert_eq!(outcome.mapped[0].cell.0, base + 1);
        // Both workers reuse the result of the same elected reference.
        assert_eq!(outcome.mapped[0].increments, vec![(CELL_STRIDE + 1) as f64]);
        assert_eq!(outcome.remaining.len(), 1);
        assert_eq!(outcome.remaining[0].cell.0, base);
    }
}
