//! Stacks broadcaster.
//!
//! Confirmation calls name the DLC's callback contract, which is resolved
//! with the read-only `get-callback-contract` before every write.

use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

use crate::{
	models::{
		blockchain::stacks::{ContractCallPayload, ContractCallTransaction},
		ChainEndpoint, ChainTag, ClarityValue, ContractId, ContractInfo, Receipt, ReceiptStatus,
		StacksAddress, StacksNetwork,
	},
	services::{
		blockchain::StacksClientTrait,
		broadcaster::{BroadcastError, WrappedContract},
		nonce::{NonceCoordinator, SigningIdentity},
	},
};

const SET_STATUS_FUNDED: &str = "set-status-funded";
const POST_CLOSE: &str = "post-close";
const GET_CALLBACK_CONTRACT: &str = "get-callback-contract";
const GET_DLC: &str = "get-dlc";

pub struct StacksWrappedContract<C: StacksClientTrait> {
	chain: ChainTag,
	network: StacksNetwork,
	deployer: StacksAddress,
	contract_name: String,
	client: Arc<C>,
	nonces: Arc<NonceCoordinator>,
	identity: SigningIdentity,
	wallet: StacksAddress,
	signer: PrivateKeySigner,
	fee: u64,
}

impl<C: StacksClientTrait> StacksWrappedContract<C> {
	/// Builds a broadcaster from a Stacks endpoint with a signing key and
	/// wallet address.
	pub fn new(
		endpoint: &ChainEndpoint,
		client: Arc<C>,
		nonces: Arc<NonceCoordinator>,
	) -> Result<Self, BroadcastError> {
		let ChainTag::Stacks(network) = endpoint.chain else {
			return Err(BroadcastError::config_error(format!(
				"{} is not a Stacks endpoint",
				endpoint.slug
			)));
		};
		let key = endpoint.signing_key.as_ref().ok_or_else(|| {
			BroadcastError::config_error(format!("{} has no signing key", endpoint.slug))
		})?;
		let wallet_address = endpoint.wallet_address.as_deref().ok_or_else(|| {
			BroadcastError::config_error(format!("{} has no wallet address", endpoint.slug))
		})?;

		let key = key.expose();
		// stacks keys carry a trailing 01 marking a compressed public key
		let key = key.strip_prefix("0x").unwrap_or(key);
		let key = if key.len() == 66 && key.ends_with("01") {
			&key[..64]
		} else {
			key
		};
		let signer: PrivateKeySigner = key
			.parse()
			.map_err(|e| BroadcastError::config_error(format!("invalid signing key: {}", e)))?;

		let wallet: StacksAddress = wallet_address
			.parse()
			.map_err(|e| BroadcastError::config_error(format!("invalid wallet address: {}", e)))?;
		let public_key = signer.credential().verifying_key().to_encoded_point(true);
		let derived = StacksAddress::from_public_key(wallet.version, public_key.as_bytes());
		if derived != wallet {
			return Err(BroadcastError::config_error(format!(
				"{}: signing key belongs to {}, not wallet {}",
				endpoint.slug, derived, wallet_address
			)));
		}
		ContractCallPayload::check_name(&endpoint.contract_name)
			.map_err(|e| BroadcastError::config_error(format!("{}: {}", endpoint.slug, e)))?;
		let deployer: StacksAddress = endpoint
			.contract_address
			.parse()
			.map_err(|e| BroadcastError::config_error(format!("invalid deployer: {}", e)))?;
		if !nonces.has_source(&endpoint.chain) {
			return Err(BroadcastError::config_error(format!(
				"no nonce source registered for {}",
				endpoint.chain
			)));
		}

		Ok(Self {
			chain: endpoint.chain,
			network,
			deployer,
			contract_name: endpoint.contract_name.clone(),
			client,
			nonces,
			identity: SigningIdentity::new(endpoint.chain, wallet_address),
			wallet,
			signer,
			fee: endpoint.stacks_fee,
		})
	}

	pub fn identity(&self) -> &SigningIdentity {
		&self.identity
	}

	fn uuid_arg(contract_id: &ContractId) -> Result<ClarityValue, BroadcastError> {
		contract_id
			.to_bytes()
			.ok()
			.filter(|bytes| !bytes.is_empty())
			.map(ClarityValue::Buffer)
			.ok_or_else(|| BroadcastError::invalid_input(format!("{} is not a hex id", contract_id)))
	}

	async fn read_only(
		&self,
		function_name: &str,
		args: &[ClarityValue],
	) -> Result<ClarityValue, BroadcastError> {
		Ok(self
			.client
			.call_read_only(
				&self.deployer.to_string(),
				&self.contract_name,
				function_name,
				&self.deployer.to_string(),
				args,
			)
			.await?)
	}

	async fn callback_contract(&self, uuid: &ClarityValue) -> Result<ClarityValue, BroadcastError> {
		let result = self
			.read_only(GET_CALLBACK_CONTRACT, std::slice::from_ref(uuid))
			.await?;
		match result.unwrapped() {
			principal @ ClarityValue::ContractPrincipal(..) => Ok(principal.clone()),
			other => Err(BroadcastError::chain_error(format!(
				"{} returned {:?}",
				GET_CALLBACK_CONTRACT, other
			))),
		}
	}

	async fn submit(
		&self,
		function_name: &str,
		contract_id: &ContractId,
		args: Vec<ClarityValue>,
	) -> Result<Receipt, BroadcastError> {
		let payload =
			ContractCallPayload::new(self.deployer, &self.contract_name, function_name, args)
				.map_err(|e| BroadcastError::invalid_input(e.to_string()))?;

		let lease = self.nonces.acquire(&self.identity).await?;
		let nonce = lease.nonce();
		let mut transaction =
			ContractCallTransaction::new(self.network, self.wallet.hash160, nonce, self.fee, payload);
		transaction.sign(&self.signer)?;

		let tx_id = self
			.client
			.broadcast_transaction(transaction.serialize())
			.await?;
		lease.commit();

		tracing::info!(
			chain = %self.chain,
			contract_id = %contract_id,
			tx_id = %tx_id,
			nonce,
			function = function_name,
			"transaction broadcast"
		);

		Ok(Receipt {
			chain: self.chain,
			contract_id: contract_id.clone(),
			tx_id,
			status: ReceiptStatus::Submitted,
			nonce: Some(nonce),
			block_number: None,
			gas_used: None,
		})
	}
}

#[async_trait]
impl<C: StacksClientTrait + 'static> WrappedContract for StacksWrappedContract<C> {
	fn chain(&self) -> ChainTag {
		self.chain
	}

	async fn set_status_funded(
		&self,
		contract_id: &ContractId,
		_btc_tx_id: &str,
	) -> Result<Receipt, BroadcastError> {
		let uuid = Self::uuid_arg(contract_id)?;
		let callback = self.callback_contract(&uuid).await?;
		self.submit(SET_STATUS_FUNDED, contract_id, vec![uuid, callback])
			.await
	}

	async fn post_close_dlc(
		&self,
		contract_id: &ContractId,
		btc_tx_id: &str,
	) -> Result<Receipt, BroadcastError> {
		if !btc_tx_id.is_ascii() {
			return Err(BroadcastError::invalid_input("btc tx id must be ascii"));
		}
		let uuid = Self::uuid_arg(contract_id)?;
		let callback = self.callback_contract(&uuid).await?;
		self.submit(
			POST_CLOSE,
			contract_id,
			vec![uuid, ClarityValue::StringAscii(btc_tx_id.to_string()), callback],
		)
		.await
	}

	async fn get_contract_info(&self, contract_id: &ContractId) -> Result<ContractInfo, BroadcastError> {
		let uuid = Self::uuid_arg(contract_id)?;
		let result = self.read_only(GET_DLC, &[uuid]).await?;
		Ok(ContractInfo {
			chain: self.chain,
			contract_id: contract_id.clone(),
			details: result.to_json(),
		})
	}
}
