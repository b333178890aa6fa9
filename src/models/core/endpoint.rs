//! One deployed DLC manager on one network.

use std::{fmt, time::Duration};

use zeroize::Zeroizing;

use crate::models::{BlockChainType, ChainTag};

/// Default Stacks transaction fee in micro-STX
pub const DEFAULT_STACKS_FEE: u64 = 100_000;

/// Default gas added on top of an EVM estimate
pub const DEFAULT_GAS_MARGIN: u64 = 10_000;

/// Private key material, wiped on drop and never printed
#[derive(Clone)]
pub struct SigningKey(Zeroizing<String>);

impl SigningKey {
	pub fn new(key: impl Into<String>) -> Self {
		Self(Zeroizing::new(key.into()))
	}

	pub fn expose(&self) -> &str {
		self.0.as_str()
	}
}

impl fmt::Debug for SigningKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SigningKey(<redacted>)")
	}
}

/// Immutable description of one configured target
#[derive(Debug, Clone)]
pub struct ChainEndpoint {
	pub slug: String,
	pub chain: ChainTag,
	pub version: String,
	/// EVM contract address, or the Stacks deployer principal
	pub contract_address: String,
	pub contract_name: String,
	/// Subscription endpoint (`ws`/`wss`, or the Stacks API base)
	pub endpoint: String,
	/// EVM JSON-RPC endpoint for writes, when it differs from `endpoint`
	pub write_endpoint: Option<String>,
	pub api_key: Option<String>,
	pub signing_key: Option<SigningKey>,
	pub wallet_address: Option<String>,
	pub precision_shift: u32,
	pub maturation_offset: Option<Duration>,
	pub stacks_fee: u64,
	pub gas_margin: u64,
	pub observe: bool,
	pub broadcast: bool,
}

fn replace_scheme(url: &str, pairs: &[(&str, &str)]) -> String {
	for (from, to) in pairs {
		if let Some(rest) = url.strip_prefix(from) {
			return format!("{}{}", to, rest);
		}
	}
	url.to_string()
}

impl ChainEndpoint {
	pub fn family(&self) -> BlockChainType {
		self.chain.family()
	}

	/// Identifier emitted in Stacks print events (`deployer.contract`), or the
	/// EVM contract address.
	pub fn contract_identifier(&self) -> String {
		match self.family() {
			BlockChainType::Stacks => format!("{}.{}", self.contract_address, self.contract_name),
			BlockChainType::EVM => self.contract_address.clone(),
		}
	}

	/// HTTP base of the endpoint without a trailing slash.
	pub fn http_base(&self) -> String {
		replace_scheme(
			self.endpoint.trim_end_matches('/'),
			&[("wss://", "https://"), ("ws://", "http://")],
		)
	}

	/// URL the reconnect supervisor dials.
	pub fn socket_url(&self) -> String {
		match self.family() {
			BlockChainType::Stacks => format!(
				"{}/extended/v1/ws",
				replace_scheme(
					&self.http_base(),
					&[("https://", "wss://"), ("http://", "ws://")],
				)
			),
			BlockChainType::EVM => format!(
				"{}{}",
				self.endpoint,
				self.api_key.as_deref().unwrap_or_default()
			),
		}
	}

	/// EVM JSON-RPC URL used by the broadcaster.
	pub fn rpc_url(&self) -> String {
		format!(
			"{}{}",
			self.write_endpoint.as_deref().unwrap_or(&self.endpoint),
			self.api_key.as_deref().unwrap_or_default()
		)
	}
}
