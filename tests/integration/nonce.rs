//! Nonce sequencing against a scripted chain.

use std::{
	collections::BTreeSet,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};

use dlc_observer::{
	models::{ChainTag, EvmNetwork, StacksNetwork},
	services::nonce::{NonceCoordinator, NonceError, SigningIdentity},
};

use crate::integration::mocks::MockChainNonce;

const CHAIN: ChainTag = ChainTag::Evm(EvmNetwork::Localhost);

fn identity() -> SigningIdentity {
	SigningIdentity::new(CHAIN, "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
}

fn coordinator(chain_nonce: Arc<AtomicU64>) -> NonceCoordinator {
	let mut source = MockChainNonce::new();
	source
		.expect_chain_nonce()
		.returning(move |_| Ok(chain_nonce.load(Ordering::SeqCst)));
	NonceCoordinator::new().with_source(CHAIN, Arc::new(source))
}

#[tokio::test]
async fn test_stale_chain_nonce_is_advanced_locally() {
	let nonces = coordinator(Arc::new(AtomicU64::new(7)));
	let id = identity();

	assert_eq!(nonces.next_nonce(&id).await.unwrap(), 7);
	assert_eq!(nonces.next_nonce(&id).await.unwrap(), 8);
	assert_eq!(nonces.next_nonce(&id).await.unwrap(), 9);
	assert_eq!(nonces.cached(&id).await, Some(9));
}

#[tokio::test]
async fn test_chain_ahead_of_cache_wins() {
	let chain_nonce = Arc::new(AtomicU64::new(3));
	let nonces = coordinator(chain_nonce.clone());
	let id = identity();

	assert_eq!(nonces.next_nonce(&id).await.unwrap(), 3);
	chain_nonce.store(20, Ordering::SeqCst);
	assert_eq!(nonces.next_nonce(&id).await.unwrap(), 20);
	assert_eq!(nonces.next_nonce(&id).await.unwrap(), 21);
}

#[tokio::test]
async fn test_dropped_lease_leaves_no_gap() {
	let nonces = coordinator(Arc::new(AtomicU64::new(7)));
	let id = identity();

	assert_eq!(nonces.next_nonce(&id).await.unwrap(), 7);
	let lease = nonces.acquire(&id).await.unwrap();
	assert_eq!(lease.nonce(), 8);
	drop(lease);

	assert_eq!(nonces.cached(&id).await, Some(7));
	assert_eq!(nonces.next_nonce(&id).await.unwrap(), 8);
}

#[tokio::test]
async fn test_source_failure_leaves_cache_untouched() {
	let mut source = MockChainNonce::new();
	source
		.expect_chain_nonce()
		.times(1)
		.returning(|_| Err(NonceError::source_error("node unreachable")));
	let nonces = NonceCoordinator::new().with_source(CHAIN, Arc::new(source));

	assert!(matches!(
		nonces.next_nonce(&identity()).await,
		Err(NonceError::SourceError(_))
	));
	assert_eq!(nonces.cached(&identity()).await, None);
}

#[tokio::test]
async fn test_unregistered_chain() {
	let nonces = coordinator(Arc::new(AtomicU64::new(0)));
	let other = SigningIdentity::new(
		ChainTag::Stacks(StacksNetwork::Testnet),
		"ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG",
	);
	assert!(matches!(
		nonces.next_nonce(&other).await,
		Err(NonceError::UnknownChain(_))
	));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_get_distinct_nonces() {
	let nonces = Arc::new(coordinator(Arc::new(AtomicU64::new(100))));

	let tasks: Vec<_> = (0..16)
		.map(|_| {
			let nonces = nonces.clone();
			tokio::spawn(async move { nonces.next_nonce(&identity()).await.unwrap() })
		})
		.collect();

	let mut issued = BTreeSet::new();
	for task in tasks {
		issued.insert(task.await.unwrap());
	}
	assert_eq!(issued, (100..116).collect::<BTreeSet<u64>>());
}
