//! Shared message-passing logic.
//!
//! This crate contains transport-independent protocol components:
//!
//! - [`transport`]: the [`Transport`] trait every backend implements
//! - [`codec`]: LZ4-compressed bincode framing with phase and message-type
//!   validation
//! - [`collective`]: the all-gather barrier
//! - [`pairwise`]: concurrent point-to-point buffer exchange
//!
//! No threads and no async runtime. Backends (in-memory mesh, loopback)
//! live in `chembal-network-memory`.

pub mod codec;
pub mod collective;
pub mod pairwise;
pub mod transport;

pub use codec::{decode_frame, encode_frame, CodecError, Phase};
pub use collective::all_gather;
pub use pairwise::{send_recv, ExchangeError};
pub use transport::{Transport, TransportError};
