//! Mock implementations of the service seams.
//!
//! - [`MockAttestor`] - attestation capability
//! - [`MockChainNonce`] - nonce source of one chain
//! - [`MockContract`] - broadcaster of one chain

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dlc_observer::{
	models::{ChainTag, ContractId, ContractInfo, Receipt},
	services::{
		attestation::{Announcement, Attestation, AttestationError, AttestationService},
		broadcaster::{BroadcastError, WrappedContract},
		nonce::{NonceError, NonceSource, SigningIdentity},
	},
};
use mockall::mock;
use serde_json::Value;

mock! {
	/// Attestor whose answers are scripted per test.
	pub Attestor {}

	#[async_trait]
	impl AttestationService for Attestor {
		async fn create_announcement(
			&self,
			contract_id: &ContractId,
			chain: ChainTag,
			maturation: Option<DateTime<Utc>>,
		) -> Result<Announcement, AttestationError>;

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
}

mock! {
	pub ChainNonce {}

	#[async_trait]
	impl NonceSource for ChainNonce {
		async fn chain_nonce(&self, identity: &SigningIdentity) -> Result<u64, NonceError>;
	}
}

mock! {
	pub Contract {}

	#[async_trait]
	impl WrappedContract for Contract {
		fn chain(&self) -> ChainTag;

		async fn set_status_funded(
			&self,
			contract_id: &ContractId,
			btc_tx_id: &str,
		) -> Result<Receipt, BroadcastError>;

		async fn post_close_dlc(
			&self,
			contract_id: &ContractId,
			btc_tx_id: &str,
		) -> Result<Receipt, BroadcastError>;

		async fn get_contract_info(&self, contract_id: &ContractId) -> Result<ContractInfo, BroadcastError>;
	}
}

/// Attestor expectation helper: readbacks after a successful request
pub fn allow_event_readback(attestor: &mut MockAttestor) {
	attestor.expect_get_event().returning(|_| Ok(None));
}
