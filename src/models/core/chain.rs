//! Chain identification.
//!
//! A [`ChainTag`] names one network of one chain family. It is parsed from its
//! textual form (`evm-sepolia`, `stx-testnet`) once, at the configuration or
//! HTTP boundary, and travels as a closed enum everywhere else.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
	blockchain::stacks::{ADDRESS_VERSION_MAINNET_SINGLESIG, ADDRESS_VERSION_TESTNET_SINGLESIG},
	BlockChainType,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainTagParseError {
	#[error("missing chain family prefix in '{0}'")]
	MissingPrefix(String),
	#[error("unknown chain family '{0}'")]
	UnknownFamily(String),
	#[error("unknown {family} network '{network}'")]
	UnknownNetwork { family: String, network: String },
}

/// EVM networks with a deployed DLC manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvmNetwork {
	Mainnet,
	Sepolia,
	Goerli,
	Localhost,
	X1Test,
}

impl EvmNetwork {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Mainnet => "mainnet",
			Self::Sepolia => "sepolia",
			Self::Goerli => "goerli",
			Self::Localhost => "localhost",
			Self::X1Test => "x1test",
		}
	}

	fn parse(network: &str) -> Option<Self> {
		match network {
			"mainnet" => Some(Self::Mainnet),
			"sepolia" => Some(Self::Sepolia),
			"goerli" => Some(Self::Goerli),
			"localhost" => Some(Self::Localhost),
			"x1test" => Some(Self::X1Test),
			_ => None,
		}
	}
}

/// Stacks networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StacksNetwork {
	Mainnet,
	Testnet,
	Mocknet,
	Local,
}

impl StacksNetwork {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Mainnet => "mainnet",
			Self::Testnet => "testnet",
			Self::Mocknet => "mocknet",
			Self::Local => "local",
		}
	}

	fn parse(network: &str) -> Option<Self> {
		match network {
			"mainnet" => Some(Self::Mainnet),
			"testnet" => Some(Self::Testnet),
			"mocknet" => Some(Self::Mocknet),
			"local" => Some(Self::Local),
			_ => None,
		}
	}

	pub fn is_mainnet(&self) -> bool {
		matches!(self, Self::Mainnet)
	}

	/// Leading byte of every serialized transaction.
	pub fn transaction_version(&self) -> u8 {
		if self.is_mainnet() {
			0x00
		} else {
			0x80
		}
	}

	pub fn chain_id(&self) -> u32 {
		if self.is_mainnet() {
			0x0000_0001
		} else {
			0x8000_0000
		}
	}

	/// Single-sig address version (`SP` on mainnet, `ST` elsewhere).
	pub fn address_version(&self) -> u8 {
		if self.is_mainnet() {
			ADDRESS_VERSION_MAINNET_SINGLESIG
		} else {
			ADDRESS_VERSION_TESTNET_SINGLESIG
		}
	}
}

/// Family plus network, rendered as `{prefix}-{network}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChainTag {
	Evm(EvmNetwork),
	Stacks(StacksNetwork),
}

impl ChainTag {
	pub fn family(&self) -> BlockChainType {
		match self {
			Self::Evm(_) => BlockChainType::EVM,
			Self::Stacks(_) => BlockChainType::Stacks,
		}
	}

	pub fn network_name(&self) -> &'static str {
		match self {
			Self::Evm(network) => network.as_str(),
			Self::Stacks(network) => network.as_str(),
		}
	}
}

impl fmt::Display for ChainTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}", self.family().tag_prefix(), self.network_name())
	}
}

impl FromStr for ChainTag {
	type Err = ChainTagParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase();
		let (family, network) = normalized
			.split_once('-')
			.ok_or_else(|| ChainTagParseError::MissingPrefix(s.to_string()))?;

		let unknown_network = || ChainTagParseError::UnknownNetwork {
			family: family.to_string(),
			network: network.to_string(),
		};

		match family {
			"evm" => EvmNetwork::parse(network)
				.map(Self::Evm)
				.ok_or_else(unknown_network),
			"stx" => StacksNetwork::parse(network)
				.map(Self::Stacks)
				.ok_or_else(unknown_network),
			other => Err(ChainTagParseError::UnknownFamily(other.to_string())),
		}
	}
}

impl TryFrom<String> for ChainTag {
	type Error = ChainTagParseError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<ChainTag> for String {
	fn from(tag: ChainTag) -> Self {
		tag.to_string()
	}
}
