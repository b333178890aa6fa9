//! Contract-call transaction encoding.
//!
//! Single-signature, standard-authorization contract calls are the only
//! transactions the broadcaster emits. Signing follows the Stacks sighash
//! scheme: the initial sighash is the txid of the transaction with its
//! spending condition cleared, the presign hash binds the auth flag, fee and
//! nonce, and the signature is a recoverable secp256k1 signature laid out as
//! `recovery_id || r || s`.

use alloy::{
	primitives::B256,
	signers::{local::PrivateKeySigner, SignerSync},
};
use sha2::{Digest, Sha512_256};

use super::{
	address::StacksAddress,
	clarity::{ClarityError, ClarityValue},
};
use crate::models::StacksNetwork;

const AUTH_STANDARD: u8 = 0x04;
const HASH_MODE_P2PKH: u8 = 0x00;
const KEY_ENCODING_COMPRESSED: u8 = 0x00;
const PAYLOAD_CONTRACT_CALL: u8 = 0x02;
const MAX_NAME_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AnchorMode {
	OnChainOnly = 0x01,
	OffChainOnly = 0x02,
	Any = 0x03,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PostConditionMode {
	Allow = 0x01,
	Deny = 0x02,
}

/// Target function and arguments of a contract call
///
/// Names are length-prefixed by a single byte on the wire and are checked on
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallPayload {
	contract_address: StacksAddress,
	contract_name: String,
	function_name: String,
	args: Vec<ClarityValue>,
}

impl ContractCallPayload {
	pub fn new(
		contract_address: StacksAddress,
		contract_name: &str,
		function_name: &str,
		args: Vec<ClarityValue>,
	) -> Result<Self, ClarityError> {
		Self::check_name(contract_name)?;
		Self::check_name(function_name)?;
		Ok(Self {
			contract_address,
			contract_name: contract_name.to_string(),
			function_name: function_name.to_string(),
			args,
		})
	}

	/// Rejects contract and function names that do not fit the wire prefix.
	pub fn check_name(name: &str) -> Result<(), ClarityError> {
		if name.len() > MAX_NAME_LEN {
			return Err(ClarityError::NameTooLong(name.to_string()));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallTransaction {
	pub network: StacksNetwork,
	pub signer: [u8; 20],
	pub nonce: u64,
	pub fee: u64,
	pub signature: [u8; 65],
	pub anchor_mode: AnchorMode,
	pub post_condition_mode: PostConditionMode,
	pub payload: ContractCallPayload,
}

fn sha512_256(data: &[u8]) -> [u8; 32] {
	let digest = Sha512_256::digest(data);
	let mut out = [0u8; 32];
	out.copy_from_slice(&digest);
	out
}

impl ContractCallTransaction {
	/// Builds an unsigned call from `signer`'s hash160 with the given nonce and fee.
	pub fn new(
		network: StacksNetwork,
		signer: [u8; 20],
		nonce: u64,
		fee: u64,
		payload: ContractCallPayload,
	) -> Self {
		Self {
			network,
			signer,
			nonce,
			fee,
			signature: [0u8; 65],
			anchor_mode: AnchorMode::OnChainOnly,
			post_condition_mode: PostConditionMode::Deny,
			payload,
		}
	}

	/// Wire encoding accepted by `POST /v2/transactions`.
	pub fn serialize(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(256);
		out.push(self.network.transaction_version());
		out.extend_from_slice(&self.network.chain_id().to_be_bytes());

		out.push(AUTH_STANDARD);
		out.push(HASH_MODE_P2PKH);
		out.extend_from_slice(&self.signer);
		out.extend_from_slice(&self.nonce.to_be_bytes());
		out.extend_from_slice(&self.fee.to_be_bytes());
		out.push(KEY_ENCODING_COMPRESSED);
		out.extend_from_slice(&self.signature);

		out.push(self.anchor_mode as u8);
		out.push(self.post_condition_mode as u8);
		// no post conditions
		out.extend_from_slice(&0u32.to_be_bytes());

		let payload = &self.payload;
		out.push(PAYLOAD_CONTRACT_CALL);
		out.push(payload.contract_address.version);
		out.extend_from_slice(&payload.contract_address.hash160);
		out.push(payload.contract_name.len() as u8);
		out.extend_from_slice(payload.contract_name.as_bytes());
		out.push(payload.function_name.len() as u8);
		out.extend_from_slice(payload.function_name.as_bytes());
		out.extend_from_slice(&(payload.args.len() as u32).to_be_bytes());
		for arg in &payload.args {
			out.extend_from_slice(&arg.serialize());
		}
		out
	}

	/// Transaction id as lowercase `0x` hex.
	pub fn txid(&self) -> String {
		format!("0x{}", hex::encode(sha512_256(&self.serialize())))
	}

	fn initial_sighash(&self) -> [u8; 32] {
		let mut cleared = self.clone();
		cleared.nonce = 0;
		cleared.fee = 0;
		cleared.signature = [0u8; 65];
		sha512_256(&cleared.serialize())
	}

	/// Hash the signer commits to.
	pub fn presign_hash(&self) -> [u8; 32] {
		let mut preimage = Vec::with_capacity(49);
		preimage.extend_from_slice(&self.initial_sighash());
		preimage.push(AUTH_STANDARD);
		preimage.extend_from_slice(&self.fee.to_be_bytes());
		preimage.extend_from_slice(&self.nonce.to_be_bytes());
		sha512_256(&preimage)
	}

	/// Signs in place. Nonce and fee must be final before calling.
	pub fn sign(&mut self, signer: &PrivateKeySigner) -> Result<(), alloy::signers::Error> {
		let hash = B256::from(self.presign_hash());
		let signature = signer.sign_hash_sync(&hash)?;

		let mut encoded = [0u8; 65];
		encoded[0] = signature.v() as u8;
		encoded[1..33].copy_from_slice(&signature.r().to_be_bytes::<32>());
		encoded[33..].copy_from_slice(&signature.s().to_be_bytes::<32>());
		self.signature = encoded;
		Ok(())
	}
}
