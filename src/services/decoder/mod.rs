//! Event decoders.
//!
//! One decoder per chain family turns raw notifications into
//! [`CanonicalEvent`](crate::models::CanonicalEvent)s. Decoders do no I/O and
//! never fail: anything they cannot use becomes a
//! [`Decoded::Ignore`](crate::models::Decoded) with a reason.

mod error;
mod evm;
mod stacks;

pub use error::DecodeError;
pub use evm::EvmDecoder;
pub use stacks::{parse_event_source, StacksDecoder, EVENT_NAMES};
