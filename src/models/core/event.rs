//! Canonical lifecycle events.
//!
//! Both decoders produce [`CanonicalEvent`] values; nothing downstream of the
//! decoders looks at chain specific payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ChainTag;

/// DLC identifier as the attestor keys it: lowercase `0x` hex of the on-chain bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
	/// Wraps an identifier received as text, normalizing hex to lowercase.
	pub fn new(id: impl Into<String>) -> Self {
		let id: String = id.into();
		let trimmed = id.trim();
		if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
			Self(format!("0x{}", trimmed[2..].to_ascii_lowercase()))
		} else {
			Self(trimmed.to_string())
		}
	}

	pub fn from_bytes(bytes: &[u8]) -> Self {
		Self(format!("0x{}", hex::encode(bytes)))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Raw identifier bytes for contract calls.
	pub fn to_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
		hex::decode(self.0.strip_prefix("0x").unwrap_or(&self.0))
	}

	/// Identifier as a 32 byte word.
	pub fn to_bytes32(&self) -> Option<[u8; 32]> {
		self.to_bytes().ok()?.try_into().ok()
	}
}

impl fmt::Display for ContractId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Lifecycle phase a dispatcher request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventPhase {
	Announcement,
	Attestation,
}

/// Decoded lifecycle event, independent of the chain it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
	ContractCreated {
		contract_id: ContractId,
		creator: String,
		protocol_wallet: Option<String>,
		callback_contract: Option<String>,
		attestors: Vec<String>,
		maturation: Option<DateTime<Utc>>,
	},
	ContractFunded {
		contract_id: ContractId,
		creator: Option<String>,
		protocol_wallet: Option<String>,
		sender: Option<String>,
	},
	ContractClosed {
		contract_id: ContractId,
		/// Chain native precision; the dispatcher applies the endpoint's shift
		outcome: i128,
		creator: Option<String>,
		protocol_wallet: Option<String>,
		sender: Option<String>,
	},
	ContractSettled {
		contract_id: ContractId,
		outcome: Option<i128>,
		btc_tx_id: Option<String>,
		creator: Option<String>,
	},
	Other {
		name: String,
		detail: Option<String>,
	},
}

/// One normalized event, consumed once by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalEvent {
	pub chain: ChainTag,
	pub tx_id: String,
	pub observed_at: DateTime<Utc>,
	pub kind: EventKind,
}

impl CanonicalEvent {
	pub fn new(chain: ChainTag, tx_id: impl Into<String>, kind: EventKind) -> Self {
		Self {
			chain,
			tx_id: tx_id.into(),
			observed_at: Utc::now(),
			kind,
		}
	}

	pub fn contract_id(&self) -> Option<&ContractId> {
		match &self.kind {
			EventKind::ContractCreated { contract_id, .. }
			| EventKind::ContractFunded { contract_id, .. }
			| EventKind::ContractClosed { contract_id, .. }
			| EventKind::ContractSettled { contract_id, .. } => Some(contract_id),
			EventKind::Other { .. } => None,
		}
	}

	pub fn kind_name(&self) -> &str {
		match &self.kind {
			EventKind::ContractCreated { .. } => "ContractCreated",
			EventKind::ContractFunded { .. } => "ContractFunded",
			EventKind::ContractClosed { .. } => "ContractClosed",
			EventKind::ContractSettled { .. } => "ContractSettled",
			EventKind::Other { name, .. } => name,
		}
	}
}

/// Why a raw notification produced no event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
	UnknownEvent(String),
	Malformed(String),
	NotSuccessful(String),
	NotFinal,
	Removed,
	OtherContract(String),
	NoEvents,
}

impl fmt::Display for IgnoreReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::UnknownEvent(name) => write!(f, "unknown event {}", name),
			Self::Malformed(msg) => write!(f, "malformed payload: {}", msg),
			Self::NotSuccessful(status) => write!(f, "transaction status {}", status),
			Self::NotFinal => write!(f, "transaction not anchored"),
			Self::Removed => write!(f, "log removed by reorg"),
			Self::OtherContract(id) => write!(f, "emitted by {}", id),
			Self::NoEvents => write!(f, "no events"),
		}
	}
}

/// Decoder verdict for one raw notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
	Event(Box<CanonicalEvent>),
	Ignore(IgnoreReason),
}

impl Decoded {
	pub fn event(event: CanonicalEvent) -> Self {
		Self::Event(Box::new(event))
	}

	pub fn into_event(self) -> Option<CanonicalEvent> {
		match self {
			Self::Event(event) => Some(*event),
			Self::Ignore(_) => None,
		}
	}
}
