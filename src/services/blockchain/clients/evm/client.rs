//! EVM-compatible blockchain client implementation.
//!
//! Write and read access to one deployed DLC manager through an alloy
//! provider. Subscriptions go through the websocket supervisor instead.

use std::time::Duration;

use alloy::{
	network::EthereumWallet,
	primitives::{Address, FixedBytes, TxHash},
	providers::{DynProvider, Provider, ProviderBuilder},
	signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use serde_json::json;

use crate::{
	models::{ChainEndpoint, DLCManager},
	services::{
		blockchain::BlockChainError,
		nonce::{NonceError, NonceSource, SigningIdentity},
	},
};

/// Confirmation transaction kinds of the DLC manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DlcWrite {
	SetStatusFunded,
	PostCloseDlc,
}

impl DlcWrite {
	pub fn function_name(&self) -> &'static str {
		match self {
			Self::SetStatusFunded => "setStatusFunded",
			Self::PostCloseDlc => "postCloseDLC",
		}
	}
}

/// Outcome of waiting for a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmTxOutcome {
	pub success: bool,
	pub block_number: Option<u64>,
	pub gas_used: u64,
}

/// Extended functionality specific to EVM-compatible blockchains
#[async_trait]
pub trait EvmClientTrait: Send + Sync {
	/// Address transactions are signed with, if a key is configured
	fn signer_address(&self) -> Option<Address>;

	/// Pending transaction count of `address`
	async fn get_transaction_count(&self, address: Address) -> Result<u64, BlockChainError>;

	/// Estimates, pads by `gas_margin` and sends a confirmation call
	///
	/// # Returns
	/// * `Result<TxHash, BlockChainError>` - Hash of the accepted transaction
	async fn submit_dlc_write(
		&self,
		call: DlcWrite,
		uuid: [u8; 32],
		btc_tx_id: &str,
		nonce: u64,
		gas_margin: u64,
	) -> Result<TxHash, BlockChainError>;

	/// Polls for the receipt of `tx_hash`, giving up after `timeout`
	async fn wait_for_receipt(
		&self,
		tx_hash: TxHash,
		timeout: Duration,
	) -> Result<Option<EvmTxOutcome>, BlockChainError>;

	/// `getDLC(uuid)` rendered as JSON
	async fn get_dlc(&self, uuid: [u8; 32]) -> Result<serde_json::Value, BlockChainError>;
}

/// Client for one DLC manager deployment
#[derive(Clone)]
pub struct EvmClient {
	provider: DynProvider,
	contract: Address,
	signer: Option<Address>,
	poll_interval: Duration,
}

impl EvmClient {
	/// Creates a client from the endpoint's JSON-RPC URL and signing key.
	///
	/// # Arguments
	/// * `endpoint` - Endpoint configuration with contract address and key
	///
	/// # Returns
	/// * `Result<Self, BlockChainError>` - New client, or an error for an
	///   unparseable URL, address or key
	pub fn new(endpoint: &ChainEndpoint) -> Result<Self, BlockChainError> {
		let url: url::Url = endpoint.rpc_url().parse().map_err(|e| {
			BlockChainError::connection_error(format!("invalid rpc url for {}: {}", endpoint.slug, e))
		})?;
		let contract: Address = endpoint.contract_address.parse().map_err(|e| {
			BlockChainError::internal_error(format!("invalid contract address: {}", e))
		})?;

		let (provider, signer) = match &endpoint.signing_key {
			Some(key) => {
				let key = key.expose();
				let signer: PrivateKeySigner = key
					.strip_prefix("0x")
					.unwrap_or(key)
					.parse()
					.map_err(|e| BlockChainError::internal_error(format!("invalid signing key: {}", e)))?;
				let address = signer.address();
				let provider = ProviderBuilder::new()
					.wallet(EthereumWallet::from(signer))
					.connect_http(url)
					.erased();
				(provider, Some(address))
			}
			None => (ProviderBuilder::new().connect_http(url).erased(), None),
		};

		Ok(Self {
			provider,
			contract,
			signer,
			poll_interval: Duration::from_secs(2),
		})
	}

	pub fn contract_address(&self) -> Address {
		self.contract
	}
}

#[async_trait]
impl EvmClientTrait for EvmClient {
	fn signer_address(&self) -> Option<Address> {
		self.signer
	}

	async fn get_transaction_count(&self, address: Address) -> Result<u64, BlockChainError> {
		Ok(self
			.provider
			.get_transaction_count(address)
			.pending()
			.await?)
	}

	async fn submit_dlc_write(
		&self,
		call: DlcWrite,
		uuid: [u8; 32],
		btc_tx_id: &str,
		nonce: u64,
		gas_margin: u64,
	) -> Result<TxHash, BlockChainError> {
		let from = self.signer.ok_or_else(|| {
			BlockChainError::transaction_error("no signing key configured for this endpoint")
		})?;
		let contract = DLCManager::new(self.contract, self.provider.clone());
		let uuid = FixedBytes::from(uuid);
		let btc_tx_id = btc_tx_id.to_string();

		let pending = match call {
			DlcWrite::SetStatusFunded => {
				let builder = contract.setStatusFunded(uuid, btc_tx_id).from(from);
				let estimate = builder.estimate_gas().await?;
				builder
					.gas(estimate.saturating_add(gas_margin))
					.nonce(nonce)
					.send()
					.await?
			}
			DlcWrite::PostCloseDlc => {
				let builder = contract.postCloseDLC(uuid, btc_tx_id).from(from);
				let estimate = builder.estimate_gas().await?;
				builder
					.gas(estimate.saturating_add(gas_margin))
					.nonce(nonce)
					.send()
					.await?
			}
		};

		Ok(*pending.tx_hash())
	}

	async fn wait_for_receipt(
		&self,
		tx_hash: TxHash,
		timeout: Duration,
	) -> Result<Option<EvmTxOutcome>, BlockChainError> {
		let deadline = tokio::time::Instant::now() + timeout;
		loop {
			if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
				return Ok(Some(EvmTxOutcome {
					success: receipt.status(),
					block_number: receipt.block_number,
					gas_used: receipt.gas_used,
				}));
			}
			if tokio::time::Instant::now() >= deadline {
				return Ok(None);
			}
			tokio::time::sleep(self.poll_interval).await;
		}
	}

	async fn get_dlc(&self, uuid: [u8; 32]) -> Result<serde_json::Value, BlockChainError> {
		let contract = DLCManager::new(self.contract, self.provider.clone());
		let dlc = contract.getDLC(FixedBytes::from(uuid)).call().await?;

		Ok(json!({
			"uuid": format!("{:#x}", dlc.uuid),
			"attestorList": dlc.attestorList,
			"protocolWallet": dlc.protocolWallet.to_string(),
			"creator": dlc.creator.to_string(),
			"outcome": dlc.outcome.to_string(),
			"status": dlc.status,
			"fundingTxId": dlc.fundingTxId,
			"closingTxId": dlc.closingTxId,
		}))
	}
}

#[async_trait]
impl NonceSource for EvmClient {
	async fn chain_nonce(&self, identity: &SigningIdentity) -> Result<u64, NonceError> {
		let address: Address = identity
			.address
			.parse()
			.map_err(|e| NonceError::source_error(format!("invalid address {}: {}", identity.address, e)))?;
		Ok(self.get_transaction_count(address).await?)
	}
}
