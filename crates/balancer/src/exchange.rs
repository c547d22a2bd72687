//! Plan-driven exchange of work and result buffers.
//!
//! [`Direction::Balance`] ships work units along the plan; a sender keeps its
//! retained chunk and forwards the rest, a receiver collects one buffer from
//! itself and one from each source. [`Direction::Unbalance`] is the same
//! primitive with sources and destinations swapped, shipping results home.
//!
//! For the unbalance direction the flat input must be the results of the
//! merged balance output, in the same order: chunk sizes are read from the
//! plan, not from the data.

use crate::error::BalanceError;
use crate::partition::partition;
use crate::plan::{RedistributionPlan, Role};
use chembal_network::{send_recv, Phase, Transport};
use chembal_types::{WireMessage, WorkerId};

/// Which way units flow along the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Work units from senders to receivers.
    Balance,
    /// Results from receivers back to their origin.
    Unbalance,
}

impl Direction {
    fn phase(self) -> Phase {
        match self {
            Direction::Balance => Phase::Balance,
            Direction::Unbalance => Phase::Unbalance,
        }
    }
}

/// Who this worker sends to and receives from in one direction.
#[derive(Debug, PartialEq, Eq)]
struct Layout {
    chunk_sizes: Vec<usize>,
    destinations: Vec<WorkerId>,
    sources: Vec<WorkerId>,
}

fn layout(role: &Role, me: WorkerId, len: usize, direction: Direction) -> Layout {
    match (role, direction) {
        (Role::Inactive, _) => Layout {
            chunk_sizes: vec![len],
            destinations: vec![me],
            sources: vec![me],
        },
        (Role::Receiver { sources, counts }, Direction::Balance) => Layout {
            chunk_sizes: counts.first().copied().into_iter().collect(),
            destinations: vec![me],
            sources: sources.clone(),
        },
        (Role::Receiver { sources, counts }, Direction::Unbalance) => Layout {
            chunk_sizes: counts.clone(),
            destinations: sources.clone(),
            sources: vec![me],
        },
        (
            Role::Sender {
                destinations,
                counts,
            },
            Direction::Balance,
        ) => Layout {
            chunk_sizes: counts.clone(),
            destinations: destinations.clone(),
            sources: vec![me],
        },
        (
            Role::Sender {
                destinations,
                counts,
            },
            Direction::Unbalance,
        ) => Layout {
            chunk_sizes: counts.last().copied().into_iter().collect(),
            destinations: vec![me],
            sources: destinations.clone(),
        },
    }
}

/// Exchange `local` along `plan` in the given direction.
///
/// Returns one buffer per source, in the order the plan lists the sources.
/// With a single worker this is `vec![local]`.
pub fn exchange<T, N>(
    transport: &N,
    plan: &RedistributionPlan,
    local: Vec<T>,
    direction: Direction,
) -> Result<Vec<Vec<T>>, BalanceError>
where
    T: WireMessage,
    N: Transport + ?Sized,
{
    if plan.size() != transport.size() {
        return Err(BalanceError::PlanSizeMismatch {
            plan: plan.size(),
            communicator: transport.size(),
        });
    }

    let me = transport.local();
    let role = plan.role(me).ok_or(BalanceError::MissingRole(me))?;
    let Layout {
        chunk_sizes,
        destinations,
        sources,
    } = layout(role, me, local.len(), direction);

    let chunks = partition(local, &chunk_sizes)?;
    Ok(send_recv(
        transport,
        direction.phase(),
        chunks,
        &destinations,
        &sources,
    )?)
}

/// Ship work units along `plan`. See [`exchange`].
pub fn balance<T, N>(
    transport: &N,
    plan: &RedistributionPlan,
    local: Vec<T>,
) -> Result<Vec<Vec<T>>, BalanceError>
where
    T: WireMessage,
    N: Transport + ?Sized,
{
    exchange(transport, plan, local, Direction::Balance)
}

/// Ship results back along the reversed `plan`. See [`exchange`].
pub fn unbalance<T, N>(
    transport: &N,
    plan: &RedistributionPlan,
    results: Vec<T>,
) -> Result<Vec<Vec<T>>, BalanceError>
where
    T: WireMessage,
    N: Transport + ?Sized,
{
    exchange(transport, plan, results, Direction::Unbalance)
}
