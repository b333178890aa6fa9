//! Confirmation transaction broadcasting.
//!
//! A [`WrappedContract`] signs and submits the two confirmation calls of a
//! DLC manager (mark funded, post close) and reads contract state. Nonces
//! always come from the shared
//! [`NonceCoordinator`](crate::services::nonce::NonceCoordinator), and the
//! lease is held from assignment until the node has accepted the
//! transaction.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::models::{ChainTag, ContractId, ContractInfo, Receipt};

mod error;
mod evm;
mod stacks;

pub use error::BroadcastError;
pub use evm::EvmWrappedContract;
pub use stacks::StacksWrappedContract;

/// Write access to one deployed DLC manager
#[async_trait]
pub trait WrappedContract: Send + Sync {
	fn chain(&self) -> ChainTag;

	/// Marks the DLC funded by `btc_tx_id`.
	async fn set_status_funded(
		&self,
		contract_id: &ContractId,
		btc_tx_id: &str,
	) -> Result<Receipt, BroadcastError>;

	/// Records the closing Bitcoin transaction of the DLC.
	async fn post_close_dlc(
		&self,
		contract_id: &ContractId,
		btc_tx_id: &str,
	) -> Result<Receipt, BroadcastError>;

	async fn get_contract_info(&self, contract_id: &ContractId) -> Result<ContractInfo, BroadcastError>;
}

/// Broadcasters by chain, one writer per chain tag
#[derive(Default, Clone)]
pub struct ContractPool {
	contracts: HashMap<ChainTag, Arc<dyn WrappedContract>>,
}

impl ContractPool {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `contract` as the writer of its chain, replacing any
	/// previous one.
	pub fn insert(&mut self, contract: Arc<dyn WrappedContract>) {
		self.contracts.insert(contract.chain(), contract);
	}

	pub fn get(&self, chain: &ChainTag) -> Option<Arc<dyn WrappedContract>> {
		self.contracts.get(chain).cloned()
	}

	/// Chains with a writer, in textual order.
	pub fn chains(&self) -> Vec<ChainTag> {
		let mut chains: Vec<ChainTag> = self.contracts.keys().copied().collect();
		chains.sort_by_key(|c| c.to_string());
		chains
	}

	pub fn len(&self) -> usize {
		self.contracts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.contracts.is_empty()
	}
}
