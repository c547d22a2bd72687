//! Concurrent point-to-point exchange of buffers.
//!
//! [`send_recv`] is the single primitive behind both directions of the
//! balancing protocol: every outgoing buffer is posted before any receive is
//! awaited, so no worker stalls on its own sends, and the call returns only
//! once every expected buffer has arrived.

use crate::codec::{decode_frame, encode_frame, CodecError, Phase};
use crate::transport::{Transport, TransportError};
use chembal_types::{WireMessage, WorkerId};
use thiserror::Error;
use tracing::trace;

/// Errors from a pairwise or collective exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("{buffers} send buffers for {destinations} destinations")]
    BufferCountMismatch { buffers: usize, destinations: usize },

    #[error("worker {0} addresses more than one buffer to itself")]
    DuplicateSelfBuffer(WorkerId),

    #[error("worker {0} expects a buffer from itself but sent none")]
    MissingSelfBuffer(WorkerId),

    #[error("worker {0} sent a buffer to itself that it never receives")]
    UnclaimedSelfBuffer(WorkerId),
}

/// Send `send_buffers[i]` to `destinations[i]` and receive one buffer from
/// each of `sources`, returned in source order.
///
/// A buffer addressed to the calling worker never touches the transport; it
/// is handed back at the position where the caller lists itself in `sources`.
/// With a single participant the send buffers are returned unchanged.
///
/// Deadlock freedom is the caller's responsibility: every worker must derive
/// its destinations and sources from the same global plan.
pub fn send_recv<T, N>(
    transport: &N,
    phase: Phase,
    send_buffers: Vec<Vec<T>>,
    destinations: &[WorkerId],
    sources: &[WorkerId],
) -> Result<Vec<Vec<T>>, ExchangeError>
where
    T: WireMessage,
    N: Transport + ?Sized,
{
    if send_buffers.len() != destinations.len() {
        return Err(ExchangeError::BufferCountMismatch {
            buffers: send_buffers.len(),
            destinations: destinations.len(),
        });
    }

    if !transport.is_parallel() {
        return Ok(send_buffers);
    }

    let me = transport.local();
    let phase_name = phase.to_string();
    let mut own: Option<Vec<T>> = None;

    for (&destination, buffer) in destinations.iter().zip(send_buffers) {
        if destination == me {
            if own.is_some() {
                return Err(ExchangeError::DuplicateSelfBuffer(me));
            }
            own = Some(buffer);
            continue;
        }

        let bytes = encode_frame(phase, T::message_type_id(), &buffer)?;
        trace!(
            worker = %me,
            to = %destination,
            %phase,
            units = buffer.len(),
            bytes = bytes.len(),
            "Posting buffer"
        );
        chembal_metrics::record_units_sent(&phase_name, buffer.len(), bytes.len());
        transport.send(destination, bytes)?;
    }

    let mut received = Vec::with_capacity(sources.len());
    for &source in sources {
        if source == me {
            let buffer = own.take().ok_or(ExchangeError::MissingSelfBuffer(me))?;
            received.push(buffer);
            continue;
        }

        let bytes = transport.receive(source)?;
        let buffer: Vec<T> = decode_frame(phase, T::message_type_id(), &bytes)?;
        trace!(
            worker = %me,
            from = %source,
            %phase,
            units = buffer.len(),
            "Received buffer"
        );
        chembal_metrics::record_units_received(&phase_name, buffer.len());
        received.push(buffer);
    }

    if own.is_some() {
        return Err(ExchangeError::UnclaimedSelfBuffer(me));
    }

    Ok(received)
}
