//! Endpoint repository errors.
//!
//! Loading the chains directory either fails as a whole (`LoadError`) or
//! because a file describes an endpoint that cannot run (`ValidationError`).
//! Constructors log at error level.

use log::error;
use std::error::Error;
use std::fmt;

use crate::models::ConfigError;

#[derive(Debug)]
pub enum RepositoryError {
	/// An endpoint definition was rejected
	ValidationError(String),

	/// The chains directory could not be read
	LoadError(String),
}

impl RepositoryError {
	fn format_message(&self) -> String {
		match self {
			Self::ValidationError(msg) => format!("Validation error: {}", msg),
			Self::LoadError(msg) => format!("Load error: {}", msg),
		}
	}

	pub fn validation_error(msg: impl Into<String>) -> Self {
		let error = Self::ValidationError(msg.into());
		error!("{}", error.format_message());
		error
	}

	pub fn load_error(msg: impl Into<String>) -> Self {
		let error = Self::LoadError(msg.into());
		error!("{}", error.format_message());
		error
	}
}

impl fmt::Display for RepositoryError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for RepositoryError {}

impl From<ConfigError> for RepositoryError {
	fn from(err: ConfigError) -> Self {
		match err {
			ConfigError::ValidationError(msg) | ConfigError::EnvError(msg) => {
				Self::validation_error(msg)
			}
			other => Self::load_error(format!("Failed to load endpoints: {}", other)),
		}
	}
}
