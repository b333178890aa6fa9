//! Endpoint configuration files.
//!
//! Every JSON file in the chains directory describes one deployed DLC manager.
//! Secrets are never stored in these files: `signing_key_env` names the
//! environment variable that holds the key.

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::models::{
	blockchain::stacks::StacksAddress, BlockChainType, ChainEndpoint, ChainTag, ConfigError,
	ConfigLoader, SigningKey, DEFAULT_GAS_MARGIN, DEFAULT_STACKS_FEE,
};

/// Directory scanned when no path is given
pub const DEFAULT_CHAINS_DIR: &str = "config/chains";

/// Largest shift whose divisor fits a signed 128 bit integer
const MAX_PRECISION_SHIFT: u32 = 38;

fn default_true() -> bool {
	true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChainEndpointConfig {
	pub slug: String,
	pub chain: ChainTag,
	pub version: String,
	pub contract_address: String,
	#[serde(default)]
	pub contract_name: Option<String>,
	pub endpoint: String,
	#[serde(default)]
	pub write_endpoint: Option<String>,
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default)]
	pub signing_key_env: Option<String>,
	#[serde(default)]
	pub wallet_address: Option<String>,
	#[serde(default)]
	pub precision_shift: u32,
	#[serde(default)]
	pub maturation_offset_secs: Option<u64>,
	#[serde(default)]
	pub stacks_fee: Option<u64>,
	#[serde(default)]
	pub gas_margin: Option<u64>,
	#[serde(default = "default_true")]
	pub observe: bool,
	#[serde(default)]
	pub broadcast: Option<bool>,
}

impl ChainEndpointConfig {
	fn default_contract_name(&self) -> &'static str {
		match self.chain.family() {
			BlockChainType::EVM => "DLCManager",
			BlockChainType::Stacks => "dlc-manager-v1",
		}
	}

	/// Builds the runtime endpoint, reading the signing key through `lookup`.
	///
	/// # Arguments
	/// * `lookup` - Environment accessor, `std::env::var` in production
	///
	/// # Returns
	/// * `Result<ChainEndpoint, ConfigError>` - The endpoint, or an error when a
	///   configured key variable is missing
	pub fn resolve<F>(&self, lookup: F) -> Result<ChainEndpoint, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let signing_key = match &self.signing_key_env {
			Some(var) => Some(SigningKey::new(lookup(var).ok_or_else(|| {
				ConfigError::env_error(format!(
					"{} is not set (signing key for endpoint '{}')",
					var, self.slug
				))
			})?)),
			None => None,
		};

		let broadcast = self.broadcast.unwrap_or(signing_key.is_some());
		if broadcast && signing_key.is_none() {
			return Err(ConfigError::validation_error(format!(
				"endpoint '{}' enables broadcast without a signing key",
				self.slug
			)));
		}

		Ok(ChainEndpoint {
			slug: self.slug.clone(),
			chain: self.chain,
			version: self.version.clone(),
			contract_address: self.contract_address.clone(),
			contract_name: self
				.contract_name
				.clone()
				.unwrap_or_else(|| self.default_contract_name().to_string()),
			endpoint: self.endpoint.clone(),
			write_endpoint: self.write_endpoint.clone(),
			api_key: self.api_key.clone(),
			signing_key,
			wallet_address: self.wallet_address.clone(),
			precision_shift: self.precision_shift,
			maturation_offset: self.maturation_offset_secs.map(Duration::from_secs),
			stacks_fee: self.stacks_fee.unwrap_or(DEFAULT_STACKS_FEE),
			gas_margin: self.gas_margin.unwrap_or(DEFAULT_GAS_MARGIN),
			observe: self.observe,
			broadcast,
		})
	}
}

impl ConfigLoader for ChainEndpointConfig {
	fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>,
	{
		let chains_dir = path.unwrap_or(Path::new(DEFAULT_CHAINS_DIR));
		let mut pairs = Vec::new();

		if !chains_dir.exists() {
			return Err(ConfigError::file_error(format!(
				"chains directory not found: {}",
				chains_dir.display()
			)));
		}

		for entry in std::fs::read_dir(chains_dir)? {
			let entry = entry?;
			let path = entry.path();

			if !Self::is_json_file(&path) {
				continue;
			}

			// one broken file must not take the other endpoints down
			match Self::load_from_path(&path) {
				Ok(config) => pairs.push((config.slug.clone(), config)),
				Err(e) => {
					tracing::warn!(path = %path.display(), error = %e, "Skipping endpoint config");
				}
			}
		}

		Ok(T::from_iter(pairs))
	}

	fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let file = std::fs::File::open(path)?;
		let config: ChainEndpointConfig = serde_json::from_reader(file)?;

		if let Err(validation_error) = config.validate() {
			return Err(ConfigError::validation_error(validation_error));
		}

		Ok(config)
	}

	fn validate(&self) -> Result<(), String> {
		if self.slug.is_empty()
			|| !self
				.slug
				.chars()
				.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
		{
			return Err(
				"Slug must contain only lowercase letters, numbers, dashes and underscores"
					.to_string(),
			);
		}

		let endpoint = url::Url::parse(&self.endpoint)
			.map_err(|e| format!("Invalid endpoint '{}': {}", self.endpoint, e))?;
		match (self.chain.family(), endpoint.scheme()) {
			(BlockChainType::EVM, "ws" | "wss") => {}
			(BlockChainType::EVM, _) => {
				return Err("EVM endpoints must be ws:// or wss:// subscription URLs".to_string())
			}
			(BlockChainType::Stacks, "ws" | "wss" | "http" | "https") => {}
			(BlockChainType::Stacks, scheme) => {
				return Err(format!("Unsupported Stacks endpoint scheme '{}'", scheme))
			}
		}

		if let Some(write_endpoint) = &self.write_endpoint {
			url::Url::parse(write_endpoint)
				.map_err(|e| format!("Invalid write_endpoint '{}': {}", write_endpoint, e))?;
		}

		match self.chain.family() {
			BlockChainType::EVM => {
				self.contract_address
					.parse::<alloy::primitives::Address>()
					.map_err(|e| format!("Invalid EVM contract address: {}", e))?;
			}
			BlockChainType::Stacks => {
				StacksAddress::from_string(&self.contract_address)
					.map_err(|e| format!("Invalid Stacks deployer address: {}", e))?;
				if self.broadcast != Some(false) && self.signing_key_env.is_some() {
					let wallet = self.wallet_address.as_deref().ok_or(
						"Stacks endpoints with a signing key need wallet_address".to_string(),
					)?;
					StacksAddress::from_string(wallet)
						.map_err(|e| format!("Invalid Stacks wallet address: {}", e))?;
				}
			}
		}

		if self.precision_shift > MAX_PRECISION_SHIFT {
			return Err(format!(
				"precision_shift must be at most {}",
				MAX_PRECISION_SHIFT
			));
		}

		if self.version.is_empty() {
			return Err("version must not be empty".to_string());
		}

		Ok(())
	}
}
