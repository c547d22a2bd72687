//! Frame encoding and decoding for exchanged buffers.
//!
//! # Wire Format
//!
//! Every payload is a bincode-encoded frame, LZ4-compressed:
//!
//! ```text
//! [LZ4 compressed bincode { phase, message_type, body: bincode bytes }]
//! ```
//!
//! The phase and message type travel with the body so the receiver can tell
//! a misaligned exchange (a worker reading a gather frame while the peer is
//! already balancing, or results where work was expected) from valid data.
//! They are checked before the body is decoded. Concentration vectors of
//! neighbouring cells repeat a lot, so LZ4 shrinks work buffers well.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Protocol phase a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// All-to-all gather (loads, reference candidates).
    Gather,
    /// Work units moving from senders to receivers.
    Balance,
    /// Results moving back along the reversed plan.
    Unbalance,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Gather => "gather",
            Phase::Balance => "balance",
            Phase::Unbalance => "unbalance",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Frame too short")]
    FrameTooShort,

    #[error("bincode decode error: {0}")]
    Decode(String),

    #[error("bincode encode error: {0}")]
    Encode(String),

    #[error("Decompression error: {0}")]
    Decompress(String),

    #[error("Unexpected phase: expected {expected}, got {actual}")]
    UnexpectedPhase { expected: Phase, actual: Phase },

    #[error("Unexpected message type: expected {expected}, got {actual}")]
    UnexpectedMessageType {
        expected: &'static str,
        actual: String,
    },
}

#[derive(Serialize)]
struct FrameRef<'a> {
    phase: Phase,
    message_type: &'a str,
    body: &'a [u8],
}

#[derive(Deserialize)]
struct Frame {
    phase: Phase,
    message_type: String,
    body: Vec<u8>,
}

/// Encode a body to wire format.
///
/// bincode-encodes the frame then LZ4-compresses it.
pub fn encode_frame<B: Serialize>(
    phase: Phase,
    message_type: &str,
    body: &B,
) -> Result<Vec<u8>, CodecError> {
    let body = bincode::serialize(body).map_err(|e| CodecError::Encode(e.to_string()))?;
    let frame = FrameRef {
        phase,
        message_type,
        body: &body,
    };
    let bytes = bincode::serialize(&frame).map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(lz4_flex::compress_prepend_size(&bytes))
}

/// Decode a body from wire format, checking phase and message type.
pub fn decode_frame<B: DeserializeOwned>(
    expected_phase: Phase,
    expected_type: &'static str,
    data: &[u8],
) -> Result<B, CodecError> {
    if data.is_empty() {
        return Err(CodecError::FrameTooShort);
    }

    let payload = lz4_flex::decompress_size_prepended(data)
        .map_err(|e| CodecError::Decompress(e.to_string()))?;
    let frame: Frame =
        bincode::deserialize(&payload).map_err(|e| CodecError::Decode(e.to_string()))?;

    if frame.phase != expected_phase {
        return Err(CodecError::UnexpectedPhase {
            expected: expected_phase,
            actual: frame.phase,
        });
    }
    if frame.message_type != expected_type {
        return Err(CodecError::UnexpectedMessageType {
            expected: expected_type,
            actual: frame.message_type,
        });
    }

    bincode::deserialize(&frame.body).map_err(|e| CodecError::Decode(e.to_string()))
}
