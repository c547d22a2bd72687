//! The balanced chemistry step.

use crate::config::{CostMeasurement, ModelConfig};
use crate::error::ModelError;
use crate::solver::ChemistrySolver;
use crate::timing::{PhaseTimings, TimingLog};
use chembal_balancer::{merge, LoadBalancer, RedistributionPlan};
use chembal_mapping::{map_step, ReferenceMapper};
use chembal_network::Transport;
use chembal_types::{ReferenceState, ResultUnit, WorkUnit, WorkerId};
use std::time::Instant;
use tracing::{debug, instrument, Level};

/// Receives the results for this worker's own cells.
pub trait ResultSink {
    fn accept(&mut self, result: ResultUnit) -> Result<(), ModelError>;
}

impl ResultSink for Vec<ResultUnit> {
    fn accept(&mut self, result: ResultUnit) -> Result<(), ModelError> {
        self.push(result);
        Ok(())
    }
}

/// Unit counts of the last step on one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Units the host passed in.
    pub units: usize,
    /// Units resolved from the reference.
    pub mapped: usize,
    /// Units integrated here after balancing.
    pub solved: usize,
}

/// One worker's chemistry step: mapping, balancing, solving and returning
/// results.
pub struct BalancedChemistryModel<N: Transport, S: ChemistrySolver> {
    balancer: LoadBalancer<N>,
    mapper: Option<ReferenceMapper>,
    reference: ReferenceState,
    solver: S,
    max_sub_step: f64,
    cost_measurement: CostMeasurement,
    timing_log: Option<TimingLog>,
    last_timings: PhaseTimings,
    last_step: StepSummary,
}

impl<N: Transport, S: ChemistrySolver> BalancedChemistryModel<N, S> {
    /// Set up the model. Creates the timing log if a directory is configured.
    pub fn new(transport: N, solver: S, config: ModelConfig) -> Result<Self, ModelError> {
        let mapper = if config.mapper.enabled {
            let mixture = config
                .mixture
                .clone()
                .ok_or(ModelError::MissingMixtureFraction)?;
            Some(ReferenceMapper::new(config.mapper.clone(), mixture))
        } else {
            None
        };

        let timing_log = config
            .timing_log_dir
            .as_deref()
            .map(|dir| TimingLog::create(dir, transport.local()))
            .transpose()?;

        Ok(Self {
            balancer: LoadBalancer::new(transport, config.balancer),
            mapper,
            reference: ReferenceState::NoReferenceYet,
            solver,
            max_sub_step: config.max_sub_step,
            cost_measurement: config.cost_measurement,
            timing_log,
            last_timings: PhaseTimings::default(),
            last_step: StepSummary::default(),
        })
    }

    pub fn worker(&self) -> WorkerId {
        self.balancer.worker()
    }

    pub fn plan(&self) -> &RedistributionPlan {
        self.balancer.plan()
    }

    pub fn reference_state(&self) -> &ReferenceState {
        &self.reference
    }

    pub fn last_timings(&self) -> &PhaseTimings {
        &self.last_timings
    }

    pub fn last_step(&self) -> &StepSummary {
        &self.last_step
    }

    pub fn timing_log(&self) -> Option<&TimingLog> {
        self.timing_log.as_ref()
    }

    /// Solve this worker's units for the step at simulation time `time`.
    ///
    /// Every worker must call this once per step. Results for all of
    /// `units` (mapped or solved, here or elsewhere) are passed to `sink`.
    /// Returns the smallest recommended sub-step among them, or infinity if
    /// there were none. Mapped results are included deliberately; each one
    /// carries the sub-step of the reference solve.
    #[instrument(level = Level::DEBUG, skip_all, fields(
        worker = %self.balancer.worker(),
        time = time,
        units = units.len(),
    ))]
    pub fn solve<R: ResultSink + ?Sized>(
        &mut self,
        time: f64,
        units: Vec<WorkUnit>,
        sink: &mut R,
    ) -> Result<f64, ModelError> {
        let mut timings = PhaseTimings::default();
        let total = units.len();
        let solver = &self.solver;
        let measurement = self.cost_measurement;
        let max_sub_step = self.max_sub_step;
        let solve_one = |unit: &WorkUnit| solve_unit(solver, measurement, max_sub_step, unit);

        let start = Instant::now();
        let (units, mapped) = match &self.mapper {
            Some(mapper) => {
                let previous = std::mem::take(&mut self.reference);
                let outcome =
                    map_step(mapper, self.balancer.transport(), units, previous, solve_one)?;
                self.reference = outcome.state;
                (outcome.remaining, outcome.mapped)
            }
            None => (units, Vec::new()),
        };
        timings.get_problem = start.elapsed();

        let start = Instant::now();
        self.balancer.update_state(&units)?;
        timings.update_state = start.elapsed();

        let own = units.len();
        let start = Instant::now();
        let buffer = merge(self.balancer.balance(units)?);
        timings.balance = start.elapsed();

        let start = Instant::now();
        let results = buffer
            .iter()
            .map(solve_one)
            .collect::<Result<Vec<_>, _>>()?;
        timings.solve_buffer = start.elapsed();

        let start = Instant::now();
        let returned = merge(self.balancer.unbalance(results)?);
        timings.unbalance = start.elapsed();

        debug!(
            own,
            solved = buffer.len(),
            mapped = mapped.len(),
            returned = returned.len(),
            "Chemistry step complete"
        );

        let mapped_count = mapped.len();
        let mut min_sub_step = f64::INFINITY;
        for result in mapped.into_iter().chain(returned) {
            min_sub_step = min_sub_step.min(result.chem_sub_step);
            sink.accept(result)?;
        }

        for (phase, duration) in timings.phases() {
            chembal_metrics::record_phase_latency(phase, duration.as_secs_f64());
        }
        if let Some(log) = self.timing_log.as_mut() {
            log.record(time, &timings)?;
        }
        self.last_timings = timings;
        self.last_step = StepSummary {
            units: total,
            mapped: mapped_count,
            solved: buffer.len(),
        };

        Ok(min_sub_step)
    }

    /// [`solve`](Self::solve) for a uniform flow time step.
    ///
    /// The returned sub-step is capped at twice the flow step so the host's
    /// time step grows by at most a factor of two.
    pub fn solve_uniform<R: ResultSink + ?Sized>(
        &mut self,
        time: f64,
        units: Vec<WorkUnit>,
        flow_time_step: f64,
        sink: &mut R,
    ) -> Result<f64, ModelError> {
        let min_sub_step = self.solve(time, units, sink)?;
        Ok(min_sub_step.min(2.0 * flow_time_step))
    }
}

fn solve_unit<S: ChemistrySolver>(
    solver: &S,
    measurement: CostMeasurement,
    max_sub_step: f64,
    unit: &WorkUnit,
) -> Result<ResultUnit, ModelError> {
    let start = Instant::now();
    let integration = solver.integrate(unit);
    let cost = match measurement {
        CostMeasurement::WallClock => start.elapsed().as_secs_f64(),
        CostMeasurement::Reported => integration.cost,
    };

    Ok(ResultUnit::from_final_state(
        unit,
        &integration.final_concentrations,
        integration.chem_sub_step,
        max_sub_step,
        cost,
    )?)
}
