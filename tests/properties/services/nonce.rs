use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

use async_trait::async_trait;
use dlc_observer::{
	models::{ChainTag, EvmNetwork},
	services::nonce::{NonceCoordinator, NonceError, NonceSource, SigningIdentity},
};
use proptest::{prelude::*, test_runner::Config};

const CHAIN: ChainTag = ChainTag::Evm(EvmNetwork::Localhost);

struct Node {
	nonce: AtomicU64,
}

#[async_trait]
impl NonceSource for Node {
	async fn chain_nonce(&self, _identity: &SigningIdentity) -> Result<u64, NonceError> {
		Ok(self.nonce.load(Ordering::SeqCst))
	}
}

/// Nonce the coordinator is expected to issue next
fn expected(chain_nonce: u64, last_issued: Option<u64>) -> u64 {
	match last_issued {
		Some(cached) if chain_nonce <= cached => cached + 1,
		_ => chain_nonce,
	}
}

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	// Each step: what the node reports, and whether the submission went out
	#[test]
	fn test_issued_nonces_follow_the_cache_rule(
		steps in prop::collection::vec((0u64..40, any::<bool>()), 1..30)
	) {
		let runtime = tokio::runtime::Builder::new_current_thread()
			.enable_all()
			.build()
			.unwrap();
		let node = Arc::new(Node { nonce: AtomicU64::new(0) });
		let coordinator = NonceCoordinator::new().with_source(CHAIN, node.clone());
		let identity = SigningIdentity::new(CHAIN, "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");

		let mut last_issued: Option<u64> = None;
		for (chain_nonce, submitted) in steps {
			node.nonce.store(chain_nonce, Ordering::SeqCst);
			let lease = runtime.block_on(coordinator.acquire(&identity)).unwrap();
			let nonce = lease.nonce();

			prop_assert_eq!(nonce, expected(chain_nonce, last_issued));
			prop_assert!(nonce >= chain_nonce);
			if let Some(previous) = last_issued {
				prop_assert!(nonce > previous);
			}

			if submitted {
				lease.commit();
				last_issued = Some(nonce);
			} else {
				drop(lease);
			}
			prop_assert_eq!(runtime.block_on(coordinator.cached(&identity)), last_issued);
		}
	}

	#[test]
	fn test_committed_nonces_never_repeat(
		chain_nonces in prop::collection::vec(0u64..10, 1..30)
	) {
		let runtime = tokio::runtime::Builder::new_current_thread()
			.enable_all()
			.build()
			.unwrap();
		let node = Arc::new(Node { nonce: AtomicU64::new(0) });
		let coordinator = NonceCoordinator::new().with_source(CHAIN, node.clone());
		let identity = SigningIdentity::new(CHAIN, "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG");

		let mut issued = Vec::new();
		for chain_nonce in chain_nonces {
			node.nonce.store(chain_nonce, Ordering::SeqCst);
			issued.push(runtime.block_on(coordinator.next_nonce(&identity)).unwrap());
		}

		prop_assert!(issued.windows(2).all(|pair| pair[0] < pair[1]));
	}
}
