//! Domain models and data structures for the DLC observer.
//!
//! This module contains all the core data structures used throughout the application:
//!
//! - `blockchain`: Chain family specific documents and encodings (EVM, Stacks)
//! - `config`: Configuration loading and validation
//! - `core`: Core domain models (ChainTag, ChainEndpoint, CanonicalEvent, Receipt)

pub mod blockchain;
mod config;
mod core;

// Re-export blockchain types
pub use blockchain::BlockChainType;

pub use blockchain::evm::{DLCManager, EVMLog};

pub use blockchain::stacks::{
	AddressTxNotification, ClarityValue, StacksAddress, TransactionDetail, TransactionSummary,
};

// Re-export core types
pub use core::{
	CanonicalEvent, ChainEndpoint, ChainTag, ChainTagParseError, ContractId, ContractInfo,
	Decoded, EventKind, EventPhase, EvmNetwork, IgnoreReason, Receipt, ReceiptStatus,
	SigningKey, StacksNetwork, DEFAULT_GAS_MARGIN, DEFAULT_STACKS_FEE,
};

// Re-export config types
pub use config::{
	resolve_attestor_list, ChainEndpointConfig, ConfigError, ConfigLoader, ServiceConfig,
};
