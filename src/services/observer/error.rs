//! Observer error types.

use log::error;
use std::{error::Error, fmt};

use crate::services::blockchain::BlockChainError;

#[derive(Debug)]
pub enum ObserverError {
	/// The endpoint cannot be observed as configured
	ConfigError(String),

	/// A transaction detail or client could not be obtained
	FetchError(String),

	/// `start` was called a second time
	AlreadyStarted,
}

impl ObserverError {
	fn format_message(&self) -> String {
		match self {
			Self::ConfigError(msg) => format!("Observer configuration error: {}", msg),
			Self::FetchError(msg) => format!("Fetch error: {}", msg),
			Self::AlreadyStarted => "Observers already started".to_string(),
		}
	}

	pub fn config_error(msg: impl Into<String>) -> Self {
		let error = Self::ConfigError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn fetch_error(msg: impl Into<String>) -> Self {
		let error = Self::FetchError(msg.into());
		error!("{}", error.format_message());
		error
	}
}

impl fmt::Display for ObserverError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for ObserverError {}

impl From<BlockChainError> for ObserverError {
	fn from(err: BlockChainError) -> Self {
		Self::fetch_error(err.to_string())
	}
}
