//! Stacks API documents.
//!
//! Shapes of the socket notifications and REST responses consumed by the
//! observer and the broadcaster. Unknown fields are ignored and optional ones
//! default so that API additions never break decoding.

use serde::{Deserialize, Serialize};

/// Transaction status reported for confirmed, successful transactions
pub const TX_STATUS_SUCCESS: &str = "success";

/// Params of an `address_tx_update` socket notification
///
/// The API places the transaction itself at `tx`. Some nodes omit it and only
/// report `tx_status`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddressTxNotification {
	pub address: String,
	pub tx_id: String,
	#[serde(default)]
	pub tx_status: String,
	#[serde(default)]
	pub tx: Option<TransactionSummary>,
}

/// The subset of a transaction needed to decide whether to fetch it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionSummary {
	pub tx_id: String,
	pub tx_status: String,
	#[serde(default)]
	pub is_unanchored: bool,
	#[serde(default)]
	pub event_count: u32,
}

impl TransactionSummary {
	pub fn is_success(&self) -> bool {
		self.tx_status == TX_STATUS_SUCCESS
	}
}

/// `GET /extended/v1/tx/{txid}` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionDetail {
	pub tx_id: String,
	pub tx_status: String,
	#[serde(default)]
	pub is_unanchored: bool,
	#[serde(default)]
	pub event_count: u32,
	#[serde(default)]
	pub block_height: Option<u64>,
	#[serde(default)]
	pub events: Vec<TransactionEvent>,
}

impl TransactionDetail {
	pub fn is_success(&self) -> bool {
		self.tx_status == TX_STATUS_SUCCESS
	}

	/// Anchored in a Bitcoin-confirmed block rather than a microblock.
	pub fn is_final(&self) -> bool {
		!self.is_unanchored
	}
}

/// One emitted transaction event
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "event_type")]
pub enum TransactionEvent {
	#[serde(rename = "smart_contract_log")]
	SmartContractLog {
		#[serde(default)]
		event_index: u32,
		contract_log: ContractLog,
	},
	#[serde(other)]
	Other,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractLog {
	pub contract_id: String,
	#[serde(default)]
	pub topic: String,
	pub value: ClarityHex,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClarityHex {
	pub hex: String,
	#[serde(default)]
	pub repr: Option<String>,
}

/// `GET /v2/accounts/{principal}` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountInfo {
	pub nonce: u64,
	#[serde(default)]
	pub balance: Option<String>,
}

/// `POST /v2/contracts/call-read/...` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadOnlyResponse {
	pub okay: bool,
	#[serde(default)]
	pub result: Option<String>,
	#[serde(default)]
	pub cause: Option<String>,
}

/// Body returned by `POST /v2/transactions` when a transaction is rejected
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BroadcastRejection {
	#[serde(default)]
	pub error: String,
	#[serde(default)]
	pub reason: Option<String>,
	#[serde(default)]
	pub txid: Option<String>,
}
