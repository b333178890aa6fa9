//! Endpoint repository implementation.
//!
//! Loads every endpoint file, resolves secrets from the environment and keeps
//! the endpoints that resolved. A file that fails to resolve is reported and
//! skipped so the remaining endpoints still start.

use std::{collections::HashMap, path::Path};

use crate::{
	models::{ChainEndpoint, ChainEndpointConfig, ChainTag, ConfigLoader},
	repositories::error::RepositoryError,
};

/// Endpoints keyed by slug, plus the slugs that were rejected
pub struct EndpointRepository {
	pub endpoints: HashMap<String, ChainEndpoint>,
	pub rejected: Vec<(String, String)>,
}

impl EndpointRepository {
	/// Loads endpoints, reading signing keys from the process environment.
	pub fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		Self::new_with_lookup(path, |key| std::env::var(key).ok())
	}

	/// Loads endpoints, reading signing keys through `lookup`.
	pub fn new_with_lookup<F>(path: Option<&Path>, lookup: F) -> Result<Self, RepositoryError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let configs: HashMap<String, ChainEndpointConfig> = ChainEndpointConfig::load_all(path)?;
		Ok(Self::from_configs(configs, lookup))
	}

	/// Resolves already loaded configuration.
	pub fn from_configs<F>(configs: HashMap<String, ChainEndpointConfig>, lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut endpoints = HashMap::new();
		let mut rejected = Vec::new();

		for (slug, config) in configs {
			match config.resolve(&lookup) {
				Ok(endpoint) => {
					endpoints.insert(slug, endpoint);
				}
				Err(e) => {
					tracing::warn!(endpoint = %slug, error = %e, "endpoint disabled");
					rejected.push((slug, e.to_string()));
				}
			}
		}

		EndpointRepository {
			endpoints,
			rejected,
		}
	}
}

/// Read access to configured endpoints
pub trait EndpointRepositoryTrait {
	fn get(&self, slug: &str) -> Option<ChainEndpoint>;
	fn get_all(&self) -> HashMap<String, ChainEndpoint>;
	fn rejected(&self) -> Vec<(String, String)>;
}

impl EndpointRepositoryTrait for EndpointRepository {
	fn get(&self, slug: &str) -> Option<ChainEndpoint> {
		self.endpoints.get(slug).cloned()
	}

	fn get_all(&self) -> HashMap<String, ChainEndpoint> {
		self.endpoints.clone()
	}

	fn rejected(&self) -> Vec<(String, String)> {
		self.rejected.clone()
	}
}

pub struct EndpointService<T: EndpointRepositoryTrait> {
	repository: T,
}

impl<T: EndpointRepositoryTrait> EndpointService<T> {
	pub fn new(path: Option<&Path>) -> Result<EndpointService<EndpointRepository>, RepositoryError> {
		let repository = EndpointRepository::new(path)?;
		Ok(EndpointService { repository })
	}

	pub fn new_with_repository(repository: T) -> Result<Self, RepositoryError> {
		Ok(EndpointService { repository })
	}

	pub fn get(&self, slug: &str) -> Option<ChainEndpoint> {
		self.repository.get(slug)
	}

	pub fn get_all(&self) -> HashMap<String, ChainEndpoint> {
		self.repository.get_all()
	}

	pub fn rejected(&self) -> Vec<(String, String)> {
		self.repository.rejected()
	}

	/// Endpoints with observation enabled, ordered by slug.
	pub fn observed(&self) -> Vec<ChainEndpoint> {
		let mut endpoints: Vec<_> = self
			.get_all()
			.into_values()
			.filter(|endpoint| endpoint.observe)
			.collect();
		endpoints.sort_by(|a, b| a.slug.cmp(&b.slug));
		endpoints
	}

	/// The endpoint that writes for `chain`.
	///
	/// When several versions of the contract are deployed on one network, the
	/// highest version wins.
	pub fn writer_for(&self, chain: &ChainTag) -> Option<ChainEndpoint> {
		self.get_all()
			.into_values()
			.filter(|endpoint| endpoint.broadcast && endpoint.chain == *chain)
			.max_by(|a, b| a.version.cmp(&b.version).then_with(|| a.slug.cmp(&b.slug)))
	}
}
