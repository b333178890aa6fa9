//! Blockchain-specific model implementations.
//!
//! This module contains type definitions for the two chain families the
//! observer understands. Each submodule holds the family specific documents,
//! contract bindings and wire encodings.

use serde::{Deserialize, Serialize};

pub mod evm;
pub mod stacks;

/// Supported blockchain platform types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BlockChainType {
	/// Ethereum Virtual Machine based chains
	EVM,
	/// Stacks (Bitcoin layer) chains
	Stacks,
}

impl BlockChainType {
	/// Prefix used by the textual chain tag, e.g. `evm-sepolia`
	pub fn tag_prefix(&self) -> &'static str {
		match self {
			Self::EVM => "evm",
			Self::Stacks => "stx",
		}
	}
}
