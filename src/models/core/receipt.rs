use serde::{Deserialize, Serialize};

use crate::models::{ChainTag, ContractId};

/// Where a submitted transaction stands when the broadcaster returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
	/// Accepted by the node mempool
	Submitted,
	/// Mined successfully
	Confirmed,
}

/// Result of a confirmation transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
	pub chain: ChainTag,
	pub contract_id: ContractId,
	pub tx_id: String,
	pub status: ReceiptStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub nonce: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub block_number: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gas_used: Option<u64>,
}

/// On-chain state of one DLC as reported by the manager contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractInfo {
	pub chain: ChainTag,
	pub contract_id: ContractId,
	pub details: serde_json::Value,
}
