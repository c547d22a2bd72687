//! Network message traits.
//!
//! These traits mark types as network messages for serialization and routing.
//! They keep this crate free of any dependency on `chembal-network`.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Marker trait for records that travel between workers.
///
/// Buffers of these records are framed with the type id so a receiver can
/// detect a misaligned exchange instead of decoding garbage.
pub trait WireMessage: Serialize + DeserializeOwned + Send + Sized {
    /// Unique message type identifier for frame validation.
    fn message_type_id() -> &'static str;
}

impl WireMessage for crate::WorkUnit {
    fn message_type_id() -> &'static str {
        "work.unit"
    }
}

impl WireMessage for crate::ResultUnit {
    fn message_type_id() -> &'static str {
        "result.unit"
    }
}

impl WireMessage for crate::LoadMetric {
    fn message_type_id() -> &'static str {
        "load.metric"
    }
}
