//! All-to-all gather.

use crate::codec::{decode_frame, encode_frame, Phase};
use crate::pairwise::ExchangeError;
use crate::transport::{Transport, TransportError};
use chembal_types::{WireMessage, WorkerId};
use tracing::trace;

/// Gather one value from every worker onto every worker.
///
/// The result has exactly one entry per worker, indexed by worker id, and is
/// identical on all workers once the call returns. Every worker blocks until
/// all others have contributed: this is the protocol's only full barrier.
pub fn all_gather<T, N>(transport: &N, value: &T) -> Result<Vec<T>, ExchangeError>
where
    T: WireMessage + Clone,
    N: Transport + ?Sized,
{
    let size = transport.size();
    let me = transport.local();
    if me.index() >= size {
        return Err(TransportError::UnknownWorker { worker: me, size }.into());
    }

    if size == 1 {
        return Ok(vec![value.clone()]);
    }

    let bytes = encode_frame(Phase::Gather, T::message_type_id(), value)?;
    for peer in (0..size).map(WorkerId::from).filter(|&p| p != me) {
        transport.send(peer, bytes.clone())?;
    }

    let mut gathered = Vec::with_capacity(size);
    for peer in (0..size).map(WorkerId::from) {
        if peer == me {
            gathered.push(value.clone());
        } else {
            let bytes = transport.receive(peer)?;
            gathered.push(decode_frame(Phase::Gather, T::message_type_id(), &bytes)?);
        }
    }

    trace!(worker = %me, size, message_type = T::message_type_id(), "Gather complete");
    Ok(gathered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairwise::tests::ScriptedTransport;
    use chembal_types::LoadMetric;

    #[test]
    fn test_single_worker_gathers_itself() {
        let transport = ScriptedTransport::new(0, 1);
        let load = LoadMetric::new(WorkerId(0), 3.5, 7);
        assert_eq!(all_gather(&transport, &load).unwrap(), vec![load]);
    }

    #[test]
    fn test_gather_orders_by_worker_id() {
        let transport = ScriptedTransport::new(1, 3);
        for peer in [0u32, 2] {
            let load = LoadMetric::new(WorkerId(peer), peer as f64 * 10.0, 1);
            transport.deliver(
                peer,
                encode_frame(Phase::Gather, LoadMetric::message_type_id(), &load).unwrap(),
            );
        }

        let mine = LoadMetric::new(WorkerId(1), 5.0, 2);
        let gathered = all_gather(&transport, &mine).unwrap();

        let workers: Vec<u32> = gathered.iter().map(|l| l.worker.0).collect();
        assert_eq!(workers, vec![0, 1, 2]);
        assert_eq!(gathered[1], mine);

        // Own value goes to both peers.
        let sent = transport.sent.lock();
        let targets: Vec<u32> = sent.iter().map(|(to, _)| to.0).collect();
        assert_eq!(targets, vec![0, 2]);
    }

    #[test]
    fn test_out_of_range_worker_rejected() {
        let transport = ScriptedTransport::new(4, 2);
        let load = LoadMetric::new(WorkerId(4), 1.0, 1);
        assert!(matches!(
            all_gather(&transport, &load),
            Err(ExchangeError::Transport(TransportError::UnknownWorker { .. }))
        ));
    }
}
