//! Attestation error types.

use log::error;
use std::{error::Error, fmt};

use crate::utils::PrecisionError;

#[derive(Debug)]
pub enum AttestationError {
	/// The attestor could not be reached
	RequestError(String),

	/// The attestor answered with a failure
	ResponseError(String),

	/// The outcome cannot be brought to attestor precision
	InvalidOutcome(String),

	/// Error from internal operations
	InternalError(String),
}

impl AttestationError {
	fn format_message(&self) -> String {
		match self {
			Self::RequestError(msg) => format!("Attestor request error: {}", msg),
			Self::ResponseError(msg) => format!("Attestor response error: {}", msg),
			Self::InvalidOutcome(msg) => format!("Invalid outcome: {}", msg),
			Self::InternalError(msg) => format!("Internal error: {}", msg),
		}
	}

	pub fn request_error(msg: impl Into<String>) -> Self {
		let error = Self::RequestError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn response_error(msg: impl Into<String>) -> Self {
		let error = Self::ResponseError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn invalid_outcome(msg: impl Into<String>) -> Self {
		let error = Self::InvalidOutcome(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn internal_error(msg: impl Into<String>) -> Self {
		let error = Self::InternalError(msg.into());
		error!("{}", error.format_message());
		error
	}
}

impl fmt::Display for AttestationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for AttestationError {}

impl From<reqwest_middleware::Error> for AttestationError {
	fn from(err: reqwest_middleware::Error) -> Self {
		Self::request_error(err.to_string())
	}
}

impl From<reqwest::Error> for AttestationError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			Self::response_error(err.to_string())
		} else {
			Self::request_error(err.to_string())
		}
	}
}

impl From<PrecisionError> for AttestationError {
	fn from(err: PrecisionError) -> Self {
		Self::invalid_outcome(err.to_string())
	}
}
