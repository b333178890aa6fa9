//! Configuration loading and validation.
//!
//! Endpoint definitions live in JSON files (one per deployed contract) and are
//! loaded through [`ConfigLoader`]. Process level settings come from the
//! environment through [`ServiceConfig`].

use std::path::Path;

mod endpoint_config;
mod error;
mod service_config;

pub use endpoint_config::ChainEndpointConfig;
pub use error::ConfigError;
pub use service_config::{resolve_attestor_list, ServiceConfig};

/// Common interface for loading configuration files
pub trait ConfigLoader: Sized {
	fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>;

	fn load_from_path(path: &Path) -> Result<Self, ConfigError>;

	fn validate(&self) -> Result<(), String>;

	fn is_json_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.to_string_lossy().to_lowercase() == "json")
			.unwrap_or(false)
	}
}
