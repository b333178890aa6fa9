//! EVM broadcaster.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
	models::{ChainTag, ContractId, ContractInfo, Receipt, ReceiptStatus},
	services::{
		blockchain::{DlcWrite, EvmClientTrait},
		broadcaster::{BroadcastError, WrappedContract},
		nonce::{NonceCoordinator, SigningIdentity},
	},
};

/// How long to wait for a receipt before answering `Submitted`
const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct EvmWrappedContract<C: EvmClientTrait> {
	chain: ChainTag,
	client: Arc<C>,
	nonces: Arc<NonceCoordinator>,
	identity: SigningIdentity,
	gas_margin: u64,
	receipt_timeout: Duration,
}

impl<C: EvmClientTrait> EvmWrappedContract<C> {
	/// Wraps a client that has a signing key.
	///
	/// # Errors
	/// Returns a configuration error when `client` cannot sign.
	pub fn new(
		chain: ChainTag,
		client: Arc<C>,
		nonces: Arc<NonceCoordinator>,
		gas_margin: u64,
	) -> Result<Self, BroadcastError> {
		let signer = client.signer_address().ok_or_else(|| {
			BroadcastError::config_error(format!("{} has no signing key", chain))
		})?;
		if !nonces.has_source(&chain) {
			return Err(BroadcastError::config_error(format!(
				"no nonce source registered for {}",
				chain
			)));
		}

		Ok(Self {
			chain,
			identity: SigningIdentity::new(chain, signer.to_string()),
			client,
			nonces,
			gas_margin,
			receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
		})
	}

	pub fn identity(&self) -> &SigningIdentity {
		&self.identity
	}

	fn uuid(contract_id: &ContractId) -> Result<[u8; 32], BroadcastError> {
		contract_id.to_bytes32().ok_or_else(|| {
			BroadcastError::invalid_input(format!("{} is not a 32 byte hex id", contract_id))
		})
	}

	async fn submit(
		&self,
		call: DlcWrite,
		contract_id: &ContractId,
		btc_tx_id: &str,
	) -> Result<Receipt, BroadcastError> {
		let uuid = Self::uuid(contract_id)?;

		let lease = self.nonces.acquire(&self.identity).await?;
		let nonce = lease.nonce();
		// a failed send drops the lease, which hands the nonce back
		let tx_hash = self
			.client
			.submit_dlc_write(call, uuid, btc_tx_id, nonce, self.gas_margin)
			.await?;
		lease.commit();

		let tx_id = format!("{:#x}", tx_hash);
		tracing::info!(
			chain = %self.chain,
			contract_id = %contract_id,
			tx_id = %tx_id,
			nonce,
			function = call.function_name(),
			"transaction submitted"
		);

		let mut receipt = Receipt {
			chain: self.chain,
			contract_id: contract_id.clone(),
			tx_id: tx_id.clone(),
			status: ReceiptStatus::Submitted,
			nonce: Some(nonce),
			block_number: None,
			gas_used: None,
		};

		match self
			.client
			.wait_for_receipt(tx_hash, self.receipt_timeout)
			.await
		{
			Ok(Some(outcome)) if outcome.success => {
				receipt.status = ReceiptStatus::Confirmed;
				receipt.block_number = outcome.block_number;
				receipt.gas_used = Some(outcome.gas_used);
			}
			Ok(Some(_)) => return Err(BroadcastError::reverted(tx_id)),
			Ok(None) => {
				tracing::warn!(tx_id = %tx_id, "no receipt before timeout");
			}
			Err(e) => {
				tracing::warn!(tx_id = %tx_id, error = %e, "receipt lookup failed");
			}
		}

		Ok(receipt)
	}
}

#[async_trait]
impl<C: EvmClientTrait + 'static> WrappedContract for EvmWrappedContract<C> {
	fn chain(&self) -> ChainTag {
		self.chain
	}

	async fn set_status_funded(
		&self,
		contract_id: &ContractId,
		btc_tx_id: &str,
	) -> Result<Receipt, BroadcastError> {
		self.submit(DlcWrite::SetStatusFunded, contract_id, btc_tx_id)
			.await
	}

	async fn post_close_dlc(
		&self,
		contract_id: &ContractId,
		btc_tx_id: &str,
	) -> Result<Receipt, BroadcastError> {
		self.submit(DlcWrite::PostCloseDlc, contract_id, btc_tx_id)
			.await
	}

	async fn get_contract_info(&self, contract_id: &ContractId) -> Result<ContractInfo, BroadcastError> {
		let details = self.client.get_dlc(Self::uuid(contract_id)?).await?;
		Ok(ContractInfo {
			chain: self.chain,
			contract_id: contract_id.clone(),
			details,
		})
	}
}
