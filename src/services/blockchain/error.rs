//! Blockchain error types and handling.
//!
//! Errors raised while reading from or writing to a chain node, independent of
//! the chain family.

use log::error;

/// Represents possible errors that can occur during blockchain operations
#[derive(Debug)]
pub enum BlockChainError {
	/// Errors related to network connectivity issues
	ConnectionError(String),

	/// Errors related to malformed requests or invalid responses
	RequestError(String),

	/// The node does not know the requested transaction (yet)
	TransactionNotFound(String),

	/// Errors related to transaction building, estimation or submission
	TransactionError(String),

	/// A read-only contract call returned an error value
	ContractCallError(String),

	/// Errors from the client pool
	ClientPoolError(String),

	/// Internal errors within the blockchain client
	InternalError(String),
}

impl BlockChainError {
	/// Formats the error message based on the error type
	fn format_message(&self) -> String {
		match self {
			Self::ConnectionError(msg) => format!("Connection error: {}", msg),
			Self::RequestError(msg) => format!("Request error: {}", msg),
			Self::TransactionNotFound(tx_id) => format!("Transaction not found: {}", tx_id),
			Self::TransactionError(msg) => format!("Transaction error: {}", msg),
			Self::ContractCallError(msg) => format!("Contract call error: {}", msg),
			Self::ClientPoolError(msg) => format!("Client pool error: {}", msg),
			Self::InternalError(msg) => format!("Internal error: {}", msg),
		}
	}

	/// Creates a new connection error with logging
	pub fn connection_error(msg: impl Into<String>) -> Self {
		let error = Self::ConnectionError(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Creates a new request error with logging
	pub fn request_error(msg: impl Into<String>) -> Self {
		let error = Self::RequestError(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Creates a new transaction not found error.
	///
	/// Logged at debug level only: a freshly announced transaction is often not
	/// indexed yet and the lookup is retried.
	pub fn transaction_not_found(tx_id: impl Into<String>) -> Self {
		let error = Self::TransactionNotFound(tx_id.into());
		log::debug!("{}", error.format_message());
		error
	}

	/// Creates a new transaction error with logging
	pub fn transaction_error(msg: impl Into<String>) -> Self {
		let error = Self::TransactionError(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Creates a new contract call error with logging
	pub fn contract_call_error(msg: impl Into<String>) -> Self {
		let error = Self::ContractCallError(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Creates a new client pool error with logging
	pub fn client_pool_error(msg: impl Into<String>) -> Self {
		let error = Self::ClientPoolError(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Creates a new internal error with logging
	pub fn internal_error(msg: impl Into<String>) -> Self {
		let error = Self::InternalError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::TransactionNotFound(_))
	}
}

// Standard error trait implementations
impl std::fmt::Display for BlockChainError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl std::error::Error for BlockChainError {}

impl From<reqwest_middleware::Error> for BlockChainError {
	fn from(err: reqwest_middleware::Error) -> Self {
		Self::connection_error(err.to_string())
	}
}

impl From<reqwest::Error> for BlockChainError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			Self::request_error(format!("unexpected response body: {}", err))
		} else {
			Self::connection_error(err.to_string())
		}
	}
}

impl From<alloy::contract::Error> for BlockChainError {
	fn from(err: alloy::contract::Error) -> Self {
		Self::transaction_error(err.to_string())
	}
}

impl From<alloy::transports::TransportError> for BlockChainError {
	fn from(err: alloy::transports::TransportError) -> Self {
		Self::connection_error(err.to_string())
	}
}

impl From<alloy::providers::PendingTransactionError> for BlockChainError {
	fn from(err: alloy::providers::PendingTransactionError) -> Self {
		Self::transaction_error(format!("waiting for receipt: {}", err))
	}
}
