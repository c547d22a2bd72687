//! Balancing strategies.
//!
//! A strategy maps the gathered load vector to a [`RedistributionPlan`]. It
//! must depend on nothing but that vector: every worker runs it independently
//! and the resulting plans have to agree exactly.

use crate::load::mean_cost;
use crate::plan::{RedistributionPlan, Transfer};
use chembal_types::LoadMetric;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Policy that decides which units move where.
///
/// Implementations never fail: when no useful transfer exists they return
/// [`RedistributionPlan::identity`].
pub trait BalancingStrategy: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Compute the plan for `loads`, which is ordered by worker id.
    fn compute_plan(&self, loads: &[LoadMetric]) -> RedistributionPlan;
}

/// Number of whole units of `sender` that add up to at most `cost`.
///
/// Uses the sender's mean per-unit cost. Zero when the sender holds no
/// costed units.
pub fn units_for_cost(sender: &LoadMetric, cost: f64) -> usize {
    match sender.cost_per_unit() {
        Some(per_unit) if cost > 0.0 => (cost / per_unit).floor() as usize,
        _ => 0,
    }
}

/// Build a plan from transfers, degrading to the identity plan on error.
fn plan_or_identity(
    strategy: &'static str,
    loads: &[LoadMetric],
    transfers: &[Transfer],
) -> RedistributionPlan {
    RedistributionPlan::from_transfers(loads, transfers).unwrap_or_else(|error| {
        warn!(strategy, %error, "Strategy produced an unusable plan, keeping units in place");
        RedistributionPlan::identity(loads)
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Min/max pair
// ═══════════════════════════════════════════════════════════════════════

/// Moves work from the single heaviest worker to the single lightest one.
///
/// The cost moved is `min(max - mean, mean - min)`, so neither endpoint
/// overshoots the mean. Ties go to the lowest worker id. At most one edge is
/// active per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMaxPairStrategy;

impl MinMaxPairStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl BalancingStrategy for MinMaxPairStrategy {
    fn name(&self) -> &'static str {
        "min-max-pair"
    }

    fn compute_plan(&self, loads: &[LoadMetric]) -> RedistributionPlan {
        let identity = || RedistributionPlan::identity(loads);
        if loads.len() < 2 {
            return identity();
        }

        // Stable scans: the first strictly smaller / larger entry wins.
        let mut receiver = &loads[0];
        let mut sender = &loads[0];
        for load in &loads[1..] {
            if load.cost < receiver.cost {
                receiver = load;
            }
            if load.cost > sender.cost {
                sender = load;
            }
        }

        if sender.worker == receiver.worker {
            return identity();
        }

        let mean = mean_cost(loads);
        let cost = (sender.cost - mean).min(mean - receiver.cost);
        let count = units_for_cost(sender, cost);
        if count == 0 || count > sender.units {
            return identity();
        }

        plan_or_identity(
            self.name(),
            loads,
            &[Transfer::new(sender.worker, receiver.worker, count)],
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Greedy pairing
// ═══════════════════════════════════════════════════════════════════════

/// Pairs overloaded and underloaded workers until every worker is near the
/// mean.
///
/// Workers are sorted by cost (ties by id). A receiver cursor walks up from
/// the lightest and a sender cursor walks down from the heaviest; each pairing
/// moves `min(surplus, deficit)` and advances whichever side reached the mean.
/// Transfers worth less than `min_transfer_fraction * mean` are dropped.
#[derive(Debug, Clone, Copy)]
pub struct GreedyPairingStrategy {
    min_transfer_fraction: f64,
}

impl GreedyPairingStrategy {
    pub fn new(min_transfer_fraction: f64) -> Self {
        Self {
            min_transfer_fraction: min_transfer_fraction.max(0.0),
        }
    }
}

impl Default for GreedyPairingStrategy {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl BalancingStrategy for GreedyPairingStrategy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn compute_plan(&self, loads: &[LoadMetric]) -> RedistributionPlan {
        if loads.len() < 2 {
            return RedistributionPlan::identity(loads);
        }
        let mean = mean_cost(loads);
        if mean <= 0.0 {
            return RedistributionPlan::identity(loads);
        }
        let tolerance = mean * 1e-9;

        let mut order: Vec<usize> = (0..loads.len()).collect();
        order.sort_by(|&a, &b| {
            loads[a]
                .cost
                .total_cmp(&loads[b].cost)
                .then(loads[a].worker.cmp(&loads[b].worker))
        });
        let mut cost: Vec<f64> = order.iter().map(|&i| loads[i].cost).collect();

        let mut moves: Vec<(usize, usize, f64)> = Vec::new();
        let (mut i, mut j) = (0, order.len() - 1);
        while i < j {
            let surplus = cost[j] - mean;
            let deficit = mean - cost[i];
            if surplus <= tolerance {
                j -= 1;
                continue;
            }
            if deficit <= tolerance {
                i += 1;
                continue;
            }

            let send = surplus.min(deficit);
            moves.push((order[j], order[i], send));
            cost[j] -= send;
            cost[i] += send;

            if (cost[j] - mean).abs() <= tolerance {
                j -= 1;
            } else {
                i += 1;
            }
        }

        let threshold = self.min_transfer_fraction * mean;
        let transfers: Vec<Transfer> = moves
            .into_iter()
            .filter(|&(_, _, send)| send >= threshold)
            .filter_map(|(from, to, send)| {
                let count = units_for_cost(&loads[from], send);
                (count > 0).then(|| Transfer::new(loads[from].worker, loads[to].worker, count))
            })
            .collect();

        if transfers.is_empty() {
            return RedistributionPlan::identity(loads);
        }
        plan_or_identity(self.name(), loads, &transfers)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Runtime selection
// ═══════════════════════════════════════════════════════════════════════

/// Built-in strategies, selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    MinMaxPair,
    Greedy,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::MinMaxPair, StrategyKind::Greedy];

    /// Instantiate the strategy.
    pub fn build(self, min_transfer_fraction: f64) -> Box<dyn BalancingStrategy> {
        match self {
            StrategyKind::MinMaxPair => Box::new(MinMaxPairStrategy::new()),
            StrategyKind::Greedy => Box::new(GreedyPairingStrategy::new(min_transfer_fraction)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::MinMaxPair => "min-max-pair",
            StrategyKind::Greedy => "greedy",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown balancing strategy {0:?} (expected min-max-pair or greedy)")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}
