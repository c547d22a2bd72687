//! The per-worker balancing facade.

use crate::config::BalancerConfig;
use crate::error::BalanceError;
use crate::exchange::{exchange, Direction};
use crate::load::{compute_load, load_imbalance};
use crate::plan::{RedistributionPlan, Role};
use crate::strategy::BalancingStrategy;
use chembal_network::{all_gather, Transport};
use chembal_types::{LoadMetric, WireMessage, WorkUnit, WorkerId};
use tracing::{debug, error, trace};

/// Owns one worker's transport, strategy and current plan.
///
/// Call [`update_state`](Self::update_state) once per step with the units that
/// will be solved, then [`balance`](Self::balance) them and later
/// [`unbalance`](Self::unbalance) their results. Every worker must make the
/// same calls in the same order.
pub struct LoadBalancer<N: Transport> {
    transport: N,
    strategy: Box<dyn BalancingStrategy>,
    config: BalancerConfig,
    plan: RedistributionPlan,
}

impl<N: Transport> LoadBalancer<N> {
    /// Create a balancer using the strategy named in `config`.
    pub fn new(transport: N, config: BalancerConfig) -> Self {
        let strategy = config.strategy.build(config.min_transfer_fraction);
        Self::with_strategy(transport, config, strategy)
    }

    /// Create a balancer with a custom strategy.
    pub fn with_strategy(
        transport: N,
        config: BalancerConfig,
        strategy: Box<dyn BalancingStrategy>,
    ) -> Self {
        let plan = RedistributionPlan::idle(transport.size());
        Self {
            transport,
            strategy,
            config,
            plan,
        }
    }

    pub fn worker(&self) -> WorkerId {
        self.transport.local()
    }

    pub fn transport(&self) -> &N {
        &self.transport
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Plan computed by the last [`update_state`](Self::update_state).
    pub fn plan(&self) -> &RedistributionPlan {
        &self.plan
    }

    /// This worker's role in the current plan.
    pub fn role(&self) -> &Role {
        self.plan.role(self.worker()).unwrap_or(&Role::Inactive)
    }

    /// Gather every worker's load and compute this step's plan.
    ///
    /// Blocks until all workers have contributed their load. Returns the
    /// gathered load vector.
    pub fn update_state(&mut self, units: &[WorkUnit]) -> Result<Vec<LoadMetric>, BalanceError> {
        let me = self.worker();
        let local = compute_load(me, units);
        chembal_metrics::set_local_load(local.cost, local.units);

        let loads = all_gather(&self.transport, &local)?;
        chembal_metrics::record_load_imbalance(load_imbalance(&loads));

        let plan = self.strategy.compute_plan(&loads);
        if self.config.validate_plans {
            if let Err(e) = plan.validate() {
                chembal_metrics::record_plan_validation_failure();
                error!(
                    worker = %me,
                    strategy = self.strategy.name(),
                    error = %e,
                    "Inconsistent redistribution plan"
                );
                return Err(e.into());
            }
        }

        self.plan = plan;
        let role = self.role();
        chembal_metrics::record_plan_role(role.kind());
        debug!(worker = %me, role = role.kind(), "{}", role.summary(me));
        trace!(worker = %me, cost = local.cost, units = local.units, "Load reported");

        Ok(loads)
    }

    /// Send surplus units to receivers and collect incoming ones.
    pub fn balance<T: WireMessage>(&self, local: Vec<T>) -> Result<Vec<Vec<T>>, BalanceError> {
        exchange(&self.transport, &self.plan, local, Direction::Balance)
    }

    /// Return results to the workers their units came from.
    pub fn unbalance<T: WireMessage>(&self, results: Vec<T>) -> Result<Vec<Vec<T>>, BalanceError> {
        exchange(&self.transport, &self.plan, results, Direction::Unbalance)
    }
}
