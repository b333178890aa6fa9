//! Nonce coordination errors.

use log::error;
use std::{error::Error, fmt};

use crate::services::blockchain::BlockChainError;

#[derive(Debug)]
pub enum NonceError {
	/// The chain could not be asked for the account nonce
	SourceError(String),

	/// No nonce source is registered for the identity's chain
	UnknownChain(String),

	/// The cached nonce cannot be incremented
	Exhausted(String),
}

impl NonceError {
	fn format_message(&self) -> String {
		match self {
			Self::SourceError(msg) => format!("Nonce source error: {}", msg),
			Self::UnknownChain(chain) => format!("No nonce source for chain {}", chain),
			Self::Exhausted(identity) => format!("Nonce space exhausted for {}", identity),
		}
	}

	pub fn source_error(msg: impl Into<String>) -> Self {
		let error = Self::SourceError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn unknown_chain(chain: impl Into<String>) -> Self {
		let error = Self::UnknownChain(chain.into());
		error!("{}", error.format_message());
		error
	}

	pub fn exhausted(identity: impl Into<String>) -> Self {
		let error = Self::Exhausted(identity.into());
		error!("{}", error.format_message());
		error
	}
}

impl fmt::Display for NonceError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for NonceError {}

impl From<BlockChainError> for NonceError {
	fn from(err: BlockChainError) -> Self {
		Self::source_error(err.to_string())
	}
}
