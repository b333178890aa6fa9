//! Bootstrap module for wiring endpoints into running services.
//!
//! This module turns the loaded endpoint configuration into the attestor
//! client, the broadcasters and the observers. A misconfigured endpoint is
//! reported and skipped; it never prevents the other endpoints from starting.
//!
//! # Services
//! - `AttestationDispatcher`: receives canonical events from every observer
//! - `ContractPool`: one broadcaster per chain, sharing one `NonceCoordinator`
//! - `ObserverService`: one observer per observed endpoint

use std::{error::Error, sync::Arc};

use reqwest_middleware::ClientWithMiddleware;

use crate::{
	models::{BlockChainType, ChainEndpoint, ChainTag, ServiceConfig},
	repositories::{EndpointRepositoryTrait, EndpointService},
	services::{
		attestation::{AttestationService, HttpAttestor},
		blockchain::{ClientPoolTrait, EvmClient, StacksClient},
		broadcaster::{
			BroadcastError, ContractPool, EvmWrappedContract, StacksWrappedContract, WrappedContract,
		},
		nonce::NonceCoordinator,
	},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Broadcasters built from the configuration
pub struct Writers {
	pub contracts: ContractPool,
	pub nonces: Arc<NonceCoordinator>,
	/// `(slug, reason)` of writer endpoints that could not be set up
	pub failed: Vec<(String, String)>,
}

enum WriterClient {
	Evm(Arc<EvmClient>),
	Stacks(Arc<StacksClient>),
}

/// Creates the attestor client, if an attestor URL is configured.
pub fn create_attestor(
	config: &ServiceConfig,
	http: ClientWithMiddleware,
) -> Option<Arc<dyn AttestationService>> {
	config.attestor_url.as_ref().map(|url| {
		tracing::info!(url = %url, "using attestor");
		Arc::new(HttpAttestor::new(http, url.clone())) as Arc<dyn AttestationService>
	})
}

/// Builds one broadcaster per chain that has a writing endpoint.
///
/// Every broadcaster takes its nonces from the same coordinator, so two
/// endpoints sharing a signing identity never race.
pub async fn build_writers<T, P>(endpoints: &EndpointService<T>, pool: &P) -> Writers
where
	T: EndpointRepositoryTrait,
	P: ClientPoolTrait,
{
	let mut chains: Vec<ChainTag> = endpoints
		.get_all()
		.values()
		.filter(|endpoint| endpoint.broadcast)
		.map(|endpoint| endpoint.chain)
		.collect();
	chains.sort_by_key(|chain| chain.to_string());
	chains.dedup();

	let mut failed = Vec::new();
	let mut writers: Vec<(ChainEndpoint, WriterClient)> = Vec::new();
	let mut coordinator = NonceCoordinator::new();

	for chain in chains {
		let Some(endpoint) = endpoints.writer_for(&chain) else {
			continue;
		};

		let client = match endpoint.family() {
			BlockChainType::EVM => pool.get_evm_client(&endpoint).await.map(|client| {
				coordinator = std::mem::take(&mut coordinator).with_source(chain, client.clone());
				WriterClient::Evm(client)
			}),
			BlockChainType::Stacks => pool.get_stacks_client(&endpoint).await.map(|client| {
				coordinator = std::mem::take(&mut coordinator).with_source(chain, client.clone());
				WriterClient::Stacks(client)
			}),
		};
		match client {
			Ok(client) => writers.push((endpoint, client)),
			Err(e) => failed.push((endpoint.slug.clone(), e.to_string())),
		}
	}

	let nonces = Arc::new(coordinator);
	let mut contracts = ContractPool::new();
	for (endpoint, client) in writers {
		let contract: std::result::Result<Arc<dyn WrappedContract>, BroadcastError> = match client {
			WriterClient::Evm(client) => {
				EvmWrappedContract::new(endpoint.chain, client, nonces.clone(), endpoint.gas_margin)
					.map(|c| Arc::new(c) as Arc<dyn WrappedContract>)
			}
			WriterClient::Stacks(client) => {
				StacksWrappedContract::new(&endpoint, client, nonces.clone())
					.map(|c| Arc::new(c) as Arc<dyn WrappedContract>)
			}
		};
		match contract {
			Ok(contract) => {
				tracing::info!(chain = %endpoint.chain, writer = %endpoint.slug, "broadcaster ready");
				contracts.insert(contract);
			}
			Err(e) => failed.push((endpoint.slug.clone(), e.to_string())),
		}
	}

	Writers {
		contracts,
		nonces,
		failed,
	}
}

/// Logs the endpoints that were rejected while loading or wiring.
pub fn report_failures(stage: &str, failed: &[(String, String)]) {
	for (slug, reason) in failed {
		tracing::error!(endpoint = %slug, stage, reason = %reason, "endpoint disabled");
	}
}
