//! Redistribution plans.
//!
//! A [`RedistributionPlan`] holds one [`Role`] per worker, indexed by worker
//! id. Strategies produce plans from a list of [`Transfer`]s through
//! [`RedistributionPlan::from_transfers`], which derives both ends of every
//! edge from the same transfer so the result is symmetric by construction.
//! [`RedistributionPlan::validate`] re-checks the whole worker set for plans
//! built any other way.

use chembal_types::{LoadMetric, WorkerId};
use std::fmt;
use thiserror::Error;

/// Units moving from one worker to another in a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: WorkerId,
    pub to: WorkerId,
    pub count: usize,
}

impl Transfer {
    pub fn new(from: WorkerId, to: WorkerId, count: usize) -> Self {
        Self { from, to, count }
    }
}

/// What one worker does in the current step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Role {
    /// Keeps all of its units and takes none.
    #[default]
    Inactive,

    /// Collects extra units.
    ///
    /// `sources[0]` is the worker itself and `counts[0]` its own unit count;
    /// the remaining entries are the senders and how many units each forwards.
    Receiver {
        sources: Vec<WorkerId>,
        counts: Vec<usize>,
    },

    /// Forwards part of its units.
    ///
    /// The last entry of `destinations` is the worker itself and the last
    /// entry of `counts` the number of units it retains.
    Sender {
        destinations: Vec<WorkerId>,
        counts: Vec<usize>,
    },
}

impl Role {
    /// Short lowercase name, used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Role::Inactive => "inactive",
            Role::Receiver { .. } => "receiver",
            Role::Sender { .. } => "sender",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Role::Inactive)
    }

    /// Render this role as seen by `worker`.
    pub fn summary(&self, worker: WorkerId) -> RoleSummary<'_> {
        RoleSummary { worker, role: self }
    }
}

/// Human-readable description of one worker's role.
pub struct RoleSummary<'a> {
    worker: WorkerId,
    role: &'a Role,
}

impl fmt::Display for RoleSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Role::Inactive => write!(f, "Rank: {} does not take part in balancing", self.worker),
            Role::Receiver { sources, counts } => write!(
                f,
                "Receiver rank: {} receives from ({}) counts: ({})",
                self.worker,
                join(&sources[1.min(sources.len())..]),
                join(&counts[1.min(counts.len())..]),
            ),
            Role::Sender {
                destinations,
                counts,
            } => {
                let n = destinations.len().saturating_sub(1);
                write!(
                    f,
                    "Sender rank: {} sends to: ({}) counts: ({}) retains: {}",
                    self.worker,
                    join(&destinations[..n]),
                    join(&counts[..n.min(counts.len())]),
                    counts.last().copied().unwrap_or(0),
                )
            }
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A plan that cannot be executed consistently by every worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("load vector entry {position} belongs to worker {worker}")]
    UnorderedLoads { position: usize, worker: WorkerId },

    #[error("{roles} roles for {workers} workers")]
    RoleCountMismatch { roles: usize, workers: usize },

    #[error("worker {worker} is outside the communicator of size {size}")]
    UnknownWorker { worker: WorkerId, size: usize },

    #[error("worker {0} transfers units to itself")]
    SelfTransfer(WorkerId),

    #[error("worker {0} would both send and receive units")]
    ConflictingRoles(WorkerId),

    #[error("worker {worker} sends {requested} units but holds only {available}")]
    Oversubscribed {
        worker: WorkerId,
        requested: usize,
        available: usize,
    },

    #[error("role of worker {0} is malformed")]
    MalformedRole(WorkerId),

    #[error("receiver {worker} lists {actual} own units but holds {expected}")]
    OwnCountMismatch {
        worker: WorkerId,
        expected: usize,
        actual: usize,
    },

    #[error("sender {worker} accounts for {actual} units but holds {expected}")]
    RetainedCountMismatch {
        worker: WorkerId,
        expected: usize,
        actual: usize,
    },

    #[error("edge {from} -> {to} ({count} units) is not mirrored by the other side")]
    AsymmetricEdge {
        from: WorkerId,
        to: WorkerId,
        count: usize,
    },
}

/// Per-step assignment of a [`Role`] to every worker.
#[derive(Debug, Clone, PartialEq)]
pub struct RedistributionPlan {
    loads: Vec<LoadMetric>,
    roles: Vec<Role>,
}

impl RedistributionPlan {
    /// The no-op plan: every worker keeps its own units.
    pub fn identity(loads: &[LoadMetric]) -> Self {
        Self {
            loads: loads.to_vec(),
            roles: vec![Role::Inactive; loads.len()],
        }
    }

    /// Identity plan for `size` workers that have reported nothing yet.
    pub fn idle(size: usize) -> Self {
        let loads: Vec<_> = (0..size)
            .map(|i| LoadMetric::new(WorkerId::from(i), 0.0, 0))
            .collect();
        Self::identity(&loads)
    }

    /// Assemble a plan from explicit roles without checking it.
    ///
    /// Use [`validate`](Self::validate) before executing such a plan.
    pub fn from_roles(loads: &[LoadMetric], roles: Vec<Role>) -> Self {
        Self {
            loads: loads.to_vec(),
            roles,
        }
    }

    /// Build a plan from point-to-point transfers.
    ///
    /// `loads` must be ordered by worker id. Zero-count transfers are dropped.
    /// Each sender's destinations and each receiver's sources keep the order
    /// in which the transfers are listed.
    pub fn from_transfers(
        loads: &[LoadMetric],
        transfers: &[Transfer],
    ) -> Result<Self, PlanError> {
        check_ordered(loads)?;
        let size = loads.len();

        let mut outgoing: Vec<Vec<(WorkerId, usize)>> = vec![Vec::new(); size];
        let mut incoming: Vec<Vec<(WorkerId, usize)>> = vec![Vec::new(); size];

        for transfer in transfers.iter().filter(|t| t.count > 0) {
            for worker in [transfer.from, transfer.to] {
                if worker.index() >= size {
                    return Err(PlanError::UnknownWorker { worker, size });
                }
            }
            if transfer.from == transfer.to {
                return Err(PlanError::SelfTransfer(transfer.from));
            }
            outgoing[transfer.from.index()].push((transfer.to, transfer.count));
            incoming[transfer.to.index()].push((transfer.from, transfer.count));
        }

        let mut roles = Vec::with_capacity(size);
        for (load, (out, inc)) in loads.iter().zip(outgoing.into_iter().zip(incoming)) {
            let me = load.worker;
            let role = match (out.is_empty(), inc.is_empty()) {
                (true, true) => Role::Inactive,
                (false, false) => return Err(PlanError::ConflictingRoles(me)),
                (false, true) => {
                    let requested: usize = out.iter().map(|&(_, count)| count).sum();
                    if requested > load.units {
                        return Err(PlanError::Oversubscribed {
                            worker: me,
                            requested,
                            available: load.units,
                        });
                    }
                    let (mut destinations, mut counts): (Vec<_>, Vec<_>) = out.into_iter().unzip();
                    destinations.push(me);
                    counts.push(load.units - requested);
                    Role::Sender {
                        destinations,
                        counts,
                    }
                }
                (true, false) => {
                    let mut sources = vec![me];
                    let mut counts = vec![load.units];
                    for (from, count) in inc {
                        sources.push(from);
                        counts.push(count);
                    }
                    Role::Receiver { sources, counts }
                }
            };
            roles.push(role);
        }

        Ok(Self {
            loads: loads.to_vec(),
            roles,
        })
    }

    /// Check that every worker can execute this plan consistently.
    ///
    /// Every edge a receiver lists must appear with the same count in the
    /// sender's destinations, and vice versa; own and retained counts must
    /// match the unit counts in the load vector.
    pub fn validate(&self) -> Result<(), PlanError> {
        check_ordered(&self.loads)?;
        let size = self.loads.len();
        if self.roles.len() != size {
            return Err(PlanError::RoleCountMismatch {
                roles: self.roles.len(),
                workers: size,
            });
        }

        for (load, role) in self.loads.iter().zip(&self.roles) {
            let me = load.worker;
            match role {
                Role::Inactive => {}
                Role::Receiver { sources, counts } => {
                    if sources.len() != counts.len() || sources.first() != Some(&me) {
                        return Err(PlanError::MalformedRole(me));
                    }
                    if counts[0] != load.units {
                        return Err(PlanError::OwnCountMismatch {
                            worker: me,
                            expected: load.units,
                            actual: counts[0],
                        });
                    }
                    for (&from, &count) in sources.iter().zip(counts).skip(1) {
                        self.check_known(from)?;
                        if from == me {
                            return Err(PlanError::SelfTransfer(me));
                        }
                        if self.sent_count(from, me) != Some(count) {
                            return Err(PlanError::AsymmetricEdge { from, to: me, count });
                        }
                    }
                }
                Role::Sender {
                    destinations,
                    counts,
                } => {
                    if destinations.len() != counts.len() || destinations.last() != Some(&me) {
                        return Err(PlanError::MalformedRole(me));
                    }
                    let accounted: usize = counts.iter().sum();
                    if accounted != load.units {
                        return Err(PlanError::RetainedCountMismatch {
                            worker: me,
                            expected: load.units,
                            actual: accounted,
                        });
                    }
                    let n = destinations.len() - 1;
                    for (&to, &count) in destinations[..n].iter().zip(counts) {
                        self.check_known(to)?;
                        if to == me {
                            return Err(PlanError::SelfTransfer(me));
                        }
                        if self.received_count(to, me) != Some(count) {
                            return Err(PlanError::AsymmetricEdge { from: me, to, count });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of workers covered by the plan.
    pub fn size(&self) -> usize {
        self.roles.len()
    }

    /// Gathered loads the plan was computed from.
    pub fn loads(&self) -> &[LoadMetric] {
        &self.loads
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn role(&self, worker: WorkerId) -> Option<&Role> {
        self.roles.get(worker.index())
    }

    /// Whether no units move at all.
    pub fn is_identity(&self) -> bool {
        self.roles.iter().all(|role| !role.is_active())
    }

    /// All edges, read from the senders' side.
    pub fn transfers(&self) -> Vec<Transfer> {
        let mut transfers = Vec::new();
        for (index, role) in self.roles.iter().enumerate() {
            if let Role::Sender {
                destinations,
                counts,
            } = role
            {
                let n = destinations.len().saturating_sub(1);
                for (&to, &count) in destinations[..n].iter().zip(counts) {
                    transfers.push(Transfer::new(WorkerId::from(index), to, count));
                }
            }
        }
        transfers
    }

    /// Units each worker will hold after balancing.
    pub fn units_after(&self) -> Vec<usize> {
        self.roles
            .iter()
            .zip(&self.loads)
            .map(|(role, load)| match role {
                Role::Inactive => load.units,
                Role::Receiver { counts, .. } => counts.iter().sum(),
                Role::Sender { counts, .. } => counts.last().copied().unwrap_or(0),
            })
            .collect()
    }

    fn check_known(&self, worker: WorkerId) -> Result<(), PlanError> {
        if worker.index() >= self.roles.len() {
            return Err(PlanError::UnknownWorker {
                worker,
                size: self.roles.len(),
            });
        }
        Ok(())
    }

    /// Count `sender` declares for `to`, if `sender` is a sender listing it.
    fn sent_count(&self, sender: WorkerId, to: WorkerId) -> Option<usize> {
        match self.roles.get(sender.index())? {
            Role::Sender {
                destinations,
                counts,
            } => {
                let n = destinations.len().saturating_sub(1);
                destinations[..n]
                    .iter()
                    .position(|&d| d == to)
                    .and_then(|i| counts.get(i).copied())
            }
            _ => None,
        }
    }

    /// Count `receiver` declares for `from`, if `receiver` is a receiver listing it.
    fn received_count(&self, receiver: WorkerId, from: WorkerId) -> Option<usize> {
        match self.roles.get(receiver.index())? {
            Role::Receiver { sources, counts } => sources
                .iter()
                .skip(1)
                .position(|&s| s == from)
                .and_then(|i| counts.get(i + 1).copied()),
            _ => None,
        }
    }
}

fn check_ordered(loads: &[LoadMetric]) -> Result<(), PlanError> {
    for (position, load) in loads.iter().enumerate() {
        if load.worker.index() != position {
            return Err(PlanError::UnorderedLoads {
                position,
                worker: load.worker,
            });
        }
    }
    Ok(())
}
