//! Per-step load balancing of chemistry work units.
//!
//! Each step every worker runs the same sequence:
//!
//! 1. [`compute_load`] sums the solve costs of its local units into a
//!    [`LoadMetric`](chembal_types::LoadMetric).
//! 2. The metrics are gathered on every worker
//!    ([`all_gather`](chembal_network::all_gather)).
//! 3. A [`BalancingStrategy`] turns the gathered vector into a
//!    [`RedistributionPlan`]. Strategies are pure functions of that vector, so
//!    every worker derives the same plan without further negotiation.
//! 4. [`exchange`] ships surplus units along the plan ([`Direction::Balance`]),
//!    and later ships their results back along the reversed plan
//!    ([`Direction::Unbalance`]).
//!
//! [`LoadBalancer`] bundles these steps around one transport.
//!
//! # Roles
//!
//! In a given step a worker is [`Role::Inactive`], a [`Role::Receiver`]
//! collecting units from one or more senders, or a [`Role::Sender`] forwarding
//! part of its units. The enum makes a worker that both sends and receives in
//! the same step unrepresentable.

mod balancer;
mod config;
mod error;
mod exchange;
mod load;
mod partition;
mod plan;
mod strategy;

pub use balancer::LoadBalancer;
pub use config::BalancerConfig;
pub use error::BalanceError;
pub use exchange::{balance, exchange, unbalance, Direction};
pub use load::{compute_load, load_imbalance, mean_cost};
pub use partition::{merge, partition, PartitionError};
pub use plan::{PlanError, RedistributionPlan, Role, RoleSummary, Transfer};
pub use strategy::{
    units_for_cost, BalancingStrategy, GreedyPairingStrategy, MinMaxPairStrategy, StrategyKind,
    UnknownStrategy,
};
