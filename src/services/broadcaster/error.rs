//! Broadcaster error types.

use log::error;
use std::{error::Error, fmt};

use crate::services::{blockchain::BlockChainError, nonce::NonceError};

#[derive(Debug)]
pub enum BroadcastError {
	/// The endpoint is not set up for writing
	ConfigError(String),

	/// Request arguments the contract call cannot be built from
	InvalidInput(String),

	/// Estimation, submission or lookup failed at the node
	ChainError(String),

	/// No nonce could be assigned
	NonceError(String),

	/// The transaction could not be signed
	SigningError(String),

	/// The transaction was mined and reverted
	Reverted(String),
}

impl BroadcastError {
	fn format_message(&self) -> String {
		match self {
			Self::ConfigError(msg) => format!("Broadcaster configuration error: {}", msg),
			Self::InvalidInput(msg) => format!("Invalid input: {}", msg),
			Self::ChainError(msg) => format!("Chain error: {}", msg),
			Self::NonceError(msg) => format!("Nonce error: {}", msg),
			Self::SigningError(msg) => format!("Signing error: {}", msg),
			Self::Reverted(tx) => format!("Transaction reverted: {}", tx),
		}
	}

	pub fn config_error(msg: impl Into<String>) -> Self {
		let error = Self::ConfigError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn invalid_input(msg: impl Into<String>) -> Self {
		let error = Self::InvalidInput(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn chain_error(msg: impl Into<String>) -> Self {
		let error = Self::ChainError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn nonce_error(msg: impl Into<String>) -> Self {
		let error = Self::NonceError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn signing_error(msg: impl Into<String>) -> Self {
		let error = Self::SigningError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn reverted(tx: impl Into<String>) -> Self {
		let error = Self::Reverted(tx.into());
		error!("{}", error.format_message());
		error
	}

	/// Whether the caller sent something unusable, as opposed to a failure
	/// on our side or the chain's.
	pub fn is_client_error(&self) -> bool {
		matches!(self, Self::InvalidInput(_))
	}
}

impl fmt::Display for BroadcastError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for BroadcastError {}

impl From<BlockChainError> for BroadcastError {
	fn from(err: BlockChainError) -> Self {
		Self::chain_error(err.to_string())
	}
}

impl From<NonceError> for BroadcastError {
	fn from(err: NonceError) -> Self {
		Self::nonce_error(err.to_string())
	}
}

impl From<alloy::signers::Error> for BroadcastError {
	fn from(err: alloy::signers::Error) -> Self {
		Self::signing_error(err.to_string())
	}
}
