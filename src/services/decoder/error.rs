//! Decoder error types.
//!
//! A `DecodeError` never leaves the decoder: it is turned into
//! `Decoded::Ignore` before the observer sees the result.

use std::error::Error;
use std::fmt;

use log::warn;

use crate::models::IgnoreReason;

#[derive(Debug)]
pub enum DecodeError {
	/// A payload field is absent or has the wrong type
	FieldError(String),
	/// The payload bytes could not be decoded at all
	PayloadError(String),
}

impl DecodeError {
	fn format_message(&self) -> String {
		match self {
			Self::FieldError(msg) => format!("Field error: {}", msg),
			Self::PayloadError(msg) => format!("Payload error: {}", msg),
		}
	}

	/// Create a new field error
	///
	/// Also logs the error message at the warn level.
	pub fn field_error(msg: impl Into<String>) -> Self {
		let error = Self::FieldError(msg.into());
		warn!("{}", error.format_message());
		error
	}

	/// Create a new payload error
	///
	/// Also logs the error message at the warn level.
	pub fn payload_error(msg: impl Into<String>) -> Self {
		let error = Self::PayloadError(msg.into());
		warn!("{}", error.format_message());
		error
	}
}

impl fmt::Display for DecodeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for DecodeError {}

impl From<DecodeError> for IgnoreReason {
	fn from(err: DecodeError) -> Self {
		IgnoreReason::Malformed(err.to_string())
	}
}

impl From<alloy::sol_types::Error> for DecodeError {
	fn from(err: alloy::sol_types::Error) -> Self {
		Self::payload_error(err.to_string())
	}
}

impl From<crate::models::blockchain::stacks::ClarityError> for DecodeError {
	fn from(err: crate::models::blockchain::stacks::ClarityError) -> Self {
		Self::payload_error(err.to_string())
	}
}
