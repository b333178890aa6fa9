//! Attestation capability and dispatch.
//!
//! The attestor is consumed through [`AttestationService`] so it can be
//! swapped for a fake in tests. [`AttestationDispatcher`] maps canonical
//! events onto announcement and attestation requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{ChainTag, ContractId};

mod client;
mod dispatcher;
mod error;

pub use client::HttpAttestor;
pub use dispatcher::{AttestationDispatcher, DispatchProfile};
pub use error::AttestationError;

/// Result of a created announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
	pub uuid: ContractId,
	/// RFC 3339 maturation time
	pub maturation: Option<String>,
}

/// Result of a signed attestation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
	pub uuid: ContractId,
	pub outcome: i128,
}

/// Oracle operations, assumed idempotent on the contract id
#[async_trait]
pub trait AttestationService: Send + Sync {
	/// Announces the event for `contract_id`, maturing at `maturation`.
	async fn create_announcement(
		&self,
		contract_id: &ContractId,
		chain: ChainTag,
		maturation: Option<DateTime<Utc>>,
	) -> Result<Announcement, AttestationError>;

	/// Signs `outcome`, already in attestor precision.
	async fn create_attestation(
		&self,
		contract_id: &ContractId,
		outcome: i128,
	) -> Result<Attestation, AttestationError>;

	async fn get_event(&self, contract_id: &ContractId) -> Result<Option<Value>, AttestationError>;

	async fn get_all_events(&self) -> Result<Value, AttestationError>;

	async fn get_public_key(&self) -> Result<String, AttestationError>;

	async fn get_health(&self) -> Result<Value, AttestationError>;
}
