//! Thread-per-worker simulation driver.

use crate::config::SimulatorConfig;
use crate::error::SimulatorError;
use crate::report::{accumulate, SimulationReport, StepStats, WorkerStep};
use crate::solver::RelaxationSolver;
use crate::workload::{advance_cells, host_chemistry, initial_cells, mixture_fraction};
use chembal_balancer::BalancerConfig;
use chembal_mapping::MapperConfig;
use chembal_metrics_memory::CountingRecorder;
use chembal_model::{BalancedChemistryModel, ModelConfig, PhaseTimings, ReactionRates};
use chembal_network::Transport;
use chembal_network_memory::{MemoryNetwork, MemoryTransport};
use chembal_types::WorkerId;
use std::fs;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info};

/// Temperature band within which light cells share the reference result.
const MAPPING_TEMPERATURE_TOLERANCE: f64 = 5.0;
const MAPPING_TOLERANCE: f64 = 1e-6;

/// Runs the balanced chemistry step on synthetic cells, one thread per
/// worker over an in-memory mesh.
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        if config.workers == 0 {
            return Err(SimulatorError::InvalidConfig(
                "at least one worker is required".into(),
            ));
        }
        if config.species < 3 {
            return Err(SimulatorError::InvalidConfig(format!(
                "need at least 3 species (fuel, inert and product), got {}",
                config.species
            )));
        }
        if config.flow_time_step.is_nan() || config.flow_time_step <= 0.0 {
            return Err(SimulatorError::InvalidConfig(format!(
                "flow time step must be positive, got {}",
                config.flow_time_step
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Run all steps and collect the report.
    ///
    /// The first worker error ends the run. Its peers then fail on the
    /// disconnected mesh; every failure is logged and the first one in worker
    /// order is returned.
    pub fn run(&self) -> Result<SimulationReport, SimulatorError> {
        let config = &self.config;
        if let Some(dir) = &config.log_dir {
            fs::create_dir_all(dir)?;
        }

        info!(
            workers = config.workers,
            cells_per_worker = config.cells_per_worker,
            species = config.species,
            steps = config.steps,
            strategy = %config.strategy,
            mapping = config.mapping,
            seed = config.seed,
            "Starting simulation"
        );

        let network = MemoryNetwork::new(config.workers);
        let traffic = network.traffic();
        let recorder = CountingRecorder::new();
        let start = Instant::now();

        let outcomes: Vec<Result<Vec<WorkerStep>, SimulatorError>> = thread::scope(|scope| {
            let handles: Vec<_> = network
                .into_transports()
                .into_iter()
                .map(|transport| {
                    let metrics = recorder.handle();
                    scope.spawn(move || {
                        chembal_metrics::with_local_recorder(metrics, || {
                            run_worker(config, transport)
                        })
                    })
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(i, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(SimulatorError::WorkerPanicked(WorkerId::from(i))))
                })
                .collect()
        });
        let elapsed = start.elapsed();

        let mut runs = Vec::with_capacity(outcomes.len());
        let mut first_error = None;
        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(steps) => runs.push(steps),
                Err(e) => {
                    error!(worker = i, error = %e, "Worker failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let mut phase_totals = PhaseTimings::default();
        for step in runs.iter().flatten() {
            accumulate(&mut phase_totals, &step.timings);
        }

        let steps: Vec<StepStats> = (0..config.steps)
            .map(|step| {
                let workers: Vec<&WorkerStep> = runs.iter().map(|run| &run[step]).collect();
                StepStats::from_workers(step, &workers)
            })
            .collect();

        let report = SimulationReport {
            workers: config.workers,
            strategy: config.strategy.as_str(),
            steps,
            phase_totals,
            traffic: traffic.report(elapsed),
            metrics: recorder.snapshot(),
            elapsed,
        };
        info!(
            elapsed_secs = elapsed.as_secs_f64(),
            imbalance_before = report.mean_imbalance_before(),
            imbalance_after = report.mean_imbalance_after(),
            mapped = report.total_mapped(),
            "Simulation complete"
        );
        Ok(report)
    }
}

fn model_config(config: &SimulatorConfig) -> Result<ModelConfig, SimulatorError> {
    let mut model = ModelConfig::new()
        .with_balancer(BalancerConfig::new().with_strategy(config.strategy))
        .with_max_sub_step(config.flow_time_step)
        .with_cost_measurement(config.cost_measurement);
    if config.mapping {
        let mapper = MapperConfig::new()
            .with_enabled(true)
            .with_tolerance(MAPPING_TOLERANCE)
            .with_temperature_tolerance(MAPPING_TEMPERATURE_TOLERANCE);
        model = model.with_mapping(mapper, mixture_fraction(config.species)?);
    }
    if let Some(dir) = &config.log_dir {
        model = model.with_timing_log_dir(dir);
    }
    Ok(model)
}

fn run_worker(
    config: &SimulatorConfig,
    transport: MemoryTransport,
) -> Result<Vec<WorkerStep>, SimulatorError> {
    let me = transport.local();
    let host = host_chemistry(config.species);
    let solver = RelaxationSolver::new(host.molar_masses.clone());
    let mut model = BalancedChemistryModel::new(transport, &solver, model_config(config)?)?;

    let mut cells = initial_cells(config, me.index());
    let mut rates = ReactionRates::new(cells.len(), host.molar_masses.clone(), config.flow_time_step);
    let mut steps = Vec::with_capacity(config.steps);

    for step in 0..config.steps {
        let time = step as f64 * config.flow_time_step;
        let units = host.collect_work_units(&cells, config.flow_time_step, &mut rates)?;
        let own_cost: f64 = units.iter().map(|u| solver.cost_of(u)).sum();

        let min_sub_step =
            model.solve_uniform(time, units, config.flow_time_step, &mut rates)?;
        let solved_cost = solver.take_work();
        advance_cells(&mut cells, &rates, &host, config.flow_time_step);

        let summary = *model.last_step();
        debug!(
            worker = %me,
            step,
            own_cost,
            solved_cost,
            mapped = summary.mapped,
            solved = summary.solved,
            "Step finished"
        );
        steps.push(WorkerStep {
            own_cost,
            solved_cost,
            units: summary.units,
            mapped: summary.mapped,
            min_sub_step,
            timings: *model.last_timings(),
        });
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeavyPattern;
    use chembal_balancer::StrategyKind;
    use tracing_test::traced_test;

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            Simulator::new(SimulatorConfig::new(0, 10)),
            Err(SimulatorError::InvalidConfig(_))
        ));
        assert!(matches!(
            Simulator::new(SimulatorConfig::new(2, 10).with_species(2)),
            Err(SimulatorError::InvalidConfig(_))
        ));
        assert!(matches!(
            Simulator::new(SimulatorConfig::new(2, 10).with_flow_time_step(0.0)),
            Err(SimulatorError::InvalidConfig(_))
        ));
    }

    #[traced_test]
    #[test]
    fn test_single_worker_run() {
        let config = SimulatorConfig::new(1, 20)
            .with_steps(2)
            .with_heavy(HeavyPattern::new(1, 0.5));
        let report = Simulator::new(config).unwrap().run().unwrap();

        assert_eq!(report.steps.len(), 2);
        assert!(report.steps.iter().all(|s| s.units == 20));
        assert!(report.steps.iter().all(|s| s.imbalance_after == 1.0));
        assert_eq!(report.traffic.total_messages, 0);
        assert_eq!(report.metrics.load_reports, 2);
        assert_eq!(report.metrics.role_count("inactive"), 2);
        assert!(logs_contain("Simulation complete"));
    }

    #[test]
    fn test_model_config_carries_strategy_and_mapping() {
        let config = SimulatorConfig::new(2, 4)
            .with_strategy(StrategyKind::Greedy)
            .with_mapping(true);
        let model = model_config(&config).unwrap();
        assert_eq!(model.balancer.strategy, StrategyKind::Greedy);
        assert!(model.mapper.enabled);
        assert!(model.mixture.is_some());
        assert_eq!(model.max_sub_step, config.flow_time_step);
    }
}
