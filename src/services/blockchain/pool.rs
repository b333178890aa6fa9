//! Client pool for managing blockchain clients.
//!
//! This module provides a thread-safe client pooling system that:
//! - Caches EVM clients by endpoint slug
//! - Caches Stacks clients by API base URL, so every endpoint and observer
//!   talking to the same node shares one client
//! - Creates clients lazily on first use
//!
//! The pool uses a fast path for existing clients and a slow path for
//! creating new ones.

use crate::{
	models::{BlockChainType, ChainEndpoint},
	services::blockchain::{BlockChainError, EvmClient, StacksClient},
};
use async_trait::async_trait;
use futures::future::BoxFuture;
use reqwest_middleware::ClientWithMiddleware;
use std::{any::Any, collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Trait for the client pool.
#[async_trait]
pub trait ClientPoolTrait: Send + Sync {
	async fn get_evm_client(
		&self,
		endpoint: &ChainEndpoint,
	) -> Result<Arc<EvmClient>, BlockChainError>;
	async fn get_stacks_client(
		&self,
		endpoint: &ChainEndpoint,
	) -> Result<Arc<StacksClient>, BlockChainError>;
}

/// Generic client storage that can hold any type of blockchain client
///
/// Clients are stored in a thread-safe way using a HashMap and an RwLock.
pub struct ClientStorage<T> {
	clients: Arc<RwLock<HashMap<String, Arc<T>>>>,
}

impl<T> ClientStorage<T> {
	pub fn new() -> Self {
		Self {
			clients: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl<T> Default for ClientStorage<T> {
	fn default() -> Self {
		Self::new()
	}
}

/// Main client pool manager that handles both chain families.
pub struct ClientPool {
	/// Map of client storages indexed by client type
	pub storages: HashMap<BlockChainType, Box<dyn Any + Send + Sync>>,
	http: ClientWithMiddleware,
}

impl ClientPool {
	/// Creates a new empty client pool.
	///
	/// # Arguments
	/// * `http` - Shared REST client used by every Stacks client
	pub fn new(http: ClientWithMiddleware) -> Self {
		let mut pool = Self {
			storages: HashMap::new(),
			http,
		};

		pool.register_client_type::<EvmClient>(BlockChainType::EVM);
		pool.register_client_type::<StacksClient>(BlockChainType::Stacks);

		pool
	}

	fn register_client_type<T: 'static + Send + Sync>(&mut self, client_type: BlockChainType) {
		self.storages
			.insert(client_type, Box::new(ClientStorage::<T>::new()));
	}

	/// Internal helper method to get or create a client of any type.
	///
	/// Uses a double-checked locking pattern:
	/// 1. Fast path with read lock to check for existing client
	/// 2. Slow path with write lock, re-checking before creating
	async fn get_or_create_client<T: Send + Sync + 'static>(
		&self,
		client_type: BlockChainType,
		key: String,
		create_fn: impl FnOnce() -> BoxFuture<'static, Result<T, BlockChainError>>,
	) -> Result<Arc<T>, BlockChainError> {
		let storage = self
			.storages
			.get(&client_type)
			.and_then(|s| s.downcast_ref::<ClientStorage<T>>())
			.ok_or_else(|| BlockChainError::client_pool_error("Invalid client type"))?;

		// Fast path: check if client exists
		if let Some(client) = storage.clients.read().await.get(&key) {
			return Ok(client.clone());
		}

		// Slow path: create new client
		let mut clients = storage.clients.write().await;
		if let Some(client) = clients.get(&key) {
			return Ok(client.clone());
		}
		let client = Arc::new(create_fn().await?);
		clients.insert(key, client.clone());
		Ok(client)
	}

	/// Get the number of clients for a given client type.
	pub async fn get_client_count<T: 'static>(&self, client_type: BlockChainType) -> usize {
		match self
			.storages
			.get(&client_type)
			.and_then(|s| s.downcast_ref::<ClientStorage<T>>())
		{
			Some(storage) => storage.clients.read().await.len(),
			None => 0,
		}
	}
}

#[async_trait]
impl ClientPoolTrait for ClientPool {
	/// Gets or creates the EVM client of `endpoint`.
	async fn get_evm_client(
		&self,
		endpoint: &ChainEndpoint,
	) -> Result<Arc<EvmClient>, BlockChainError> {
		let endpoint = endpoint.clone();
		self.get_or_create_client(BlockChainType::EVM, endpoint.slug.clone(), move || {
			Box::pin(async move { EvmClient::new(&endpoint) })
		})
		.await
	}

	/// Gets or creates the Stacks client for the API `endpoint` points at.
	async fn get_stacks_client(
		&self,
		endpoint: &ChainEndpoint,
	) -> Result<Arc<StacksClient>, BlockChainError> {
		let base_url = endpoint.http_base();
		let http = self.http.clone();
		self.get_or_create_client(BlockChainType::Stacks, base_url.clone(), move || {
			Box::pin(async move { Ok(StacksClient::new(http, base_url)) })
		})
		.await
	}
}
