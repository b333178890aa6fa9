//! Per-identity nonce sequencing.
//!
//! The authoritative nonce lives on the chain and lags behind submissions that
//! are still in flight. The coordinator keeps the last nonce it issued for each
//! signing identity and, inside a critical section per identity:
//!
//! - adopts the chain's value when nothing is cached or the chain is ahead
//! - otherwise issues the cached value plus one
//!
//! The critical section is held by a [`NonceLease`] until the caller has
//! submitted its transaction, so no other submission from the same identity
//! can interleave between nonce assignment and broadcast. A lease dropped
//! without [`NonceLease::commit`] restores the previous cache entry.
//!
//! State is process local. Two processes signing with the same key will race.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{models::ChainTag, services::nonce::error::NonceError};

/// Account whose transactions are sequenced: a wallet on one network
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SigningIdentity {
	pub chain: ChainTag,
	pub address: String,
}

impl SigningIdentity {
	pub fn new(chain: ChainTag, address: impl Into<String>) -> Self {
		Self {
			chain,
			address: address.into(),
		}
	}
}

impl fmt::Display for SigningIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.chain, self.address)
	}
}

/// Reads the next nonce the chain expects from an account
#[async_trait]
pub trait NonceSource: Send + Sync {
	async fn chain_nonce(&self, identity: &SigningIdentity) -> Result<u64, NonceError>;
}

#[derive(Debug, Default)]
struct NonceState {
	last_issued: Option<u64>,
}

/// Exclusive right to submit one transaction with [`NonceLease::nonce`]
pub struct NonceLease {
	identity: SigningIdentity,
	nonce: u64,
	previous: Option<u64>,
	committed: bool,
	guard: OwnedMutexGuard<NonceState>,
}

impl NonceLease {
	pub fn nonce(&self) -> u64 {
		self.nonce
	}

	pub fn identity(&self) -> &SigningIdentity {
		&self.identity
	}

	/// Marks the nonce as used and releases the identity.
	pub fn commit(mut self) -> u64 {
		self.committed = true;
		self.nonce
	}
}

impl Drop for NonceLease {
	fn drop(&mut self) {
		if !self.committed {
			tracing::debug!(
				identity = %self.identity,
				nonce = self.nonce,
				"nonce released unused"
			);
			self.guard.last_issued = self.previous;
		}
	}
}

impl fmt::Debug for NonceLease {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NonceLease")
			.field("identity", &self.identity)
			.field("nonce", &self.nonce)
			.field("committed", &self.committed)
			.finish()
	}
}

pub struct NonceCoordinator {
	sources: HashMap<ChainTag, Arc<dyn NonceSource>>,
	states: RwLock<HashMap<SigningIdentity, Arc<Mutex<NonceState>>>>,
}

impl Default for NonceCoordinator {
	fn default() -> Self {
		Self::new()
	}
}

impl NonceCoordinator {
	pub fn new() -> Self {
		Self {
			sources: HashMap::new(),
			states: RwLock::new(HashMap::new()),
		}
	}

	/// Registers where nonces of accounts on `chain` are read from.
	pub fn with_source(mut self, chain: ChainTag, source: Arc<dyn NonceSource>) -> Self {
		self.sources.insert(chain, source);
		self
	}

	pub fn has_source(&self, chain: &ChainTag) -> bool {
		self.sources.contains_key(chain)
	}

	async fn slot(&self, identity: &SigningIdentity) -> Arc<Mutex<NonceState>> {
		if let Some(slot) = self.states.read().await.get(identity) {
			return slot.clone();
		}

		let mut states = self.states.write().await;
		states
			.entry(identity.clone())
			.or_insert_with(|| Arc::new(Mutex::new(NonceState::default())))
			.clone()
	}

	/// Assigns the next nonce for `identity` and holds its critical section
	/// until the returned lease is committed or dropped.
	///
	/// # Arguments
	/// * `identity` - Network and wallet address
	///
	/// # Returns
	/// * `Result<NonceLease, NonceError>` - The lease, or an error when the
	///   chain could not be queried (the cache is left untouched)
	pub async fn acquire(&self, identity: &SigningIdentity) -> Result<NonceLease, NonceError> {
		let source = self
			.sources
			.get(&identity.chain)
			.ok_or_else(|| NonceError::unknown_chain(identity.chain.to_string()))?
			.clone();

		let mut guard = self.slot(identity).await.lock_owned().await;
		let chain_nonce = source.chain_nonce(identity).await?;
		let previous = guard.last_issued;

		let nonce = match previous {
			Some(cached) if chain_nonce <= cached => cached
				.checked_add(1)
				.ok_or_else(|| NonceError::exhausted(identity.to_string()))?,
			_ => chain_nonce,
		};
		guard.last_issued = Some(nonce);

		tracing::debug!(
			identity = %identity,
			chain_nonce,
			cached = ?previous,
			nonce,
			"nonce assigned"
		);

		Ok(NonceLease {
			identity: identity.clone(),
			nonce,
			previous,
			committed: false,
			guard,
		})
	}

	/// Assigns and immediately commits the next nonce.
	pub async fn next_nonce(&self, identity: &SigningIdentity) -> Result<u64, NonceError> {
		Ok(self.acquire(identity).await?.commit())
	}

	/// Last nonce issued to `identity`, if any.
	pub async fn cached(&self, identity: &SigningIdentity) -> Option<u64> {
		let slot = self.states.read().await.get(identity).cloned()?;
		let state = slot.lock().await;
		state.last_issued
	}
}
