//! Core domain models for the observer.
//!
//! This module contains the fundamental data structures that represent:
//! - Chain tags: which family and network a value belongs to
//! - Endpoints: one deployed contract on one network
//! - Events: the canonical lifecycle events produced by the decoders
//! - Receipts: results of confirmation transactions

mod chain;
mod endpoint;
mod event;
mod receipt;

pub use chain::{ChainTag, ChainTagParseError, EvmNetwork, StacksNetwork};
pub use endpoint::{ChainEndpoint, SigningKey, DEFAULT_GAS_MARGIN, DEFAULT_STACKS_FEE};
pub use event::{CanonicalEvent, ContractId, Decoded, EventKind, EventPhase, IgnoreReason};
pub use receipt::{ContractInfo, Receipt, ReceiptStatus};
