//! EVM observer.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::{
	models::{ChainEndpoint, Decoded, EVMLog},
	services::{
		attestation::{AttestationDispatcher, DispatchProfile},
		blockchain::EvmLogFeed,
		decoder::EvmDecoder,
		observer::{NotificationHandler, ObserverError},
	},
};

/// Observes the DLC manager logs of one EVM deployment
pub struct EvmObserver {
	slug: String,
	address: Address,
	decoder: EvmDecoder,
	profile: DispatchProfile,
	dispatcher: Arc<AttestationDispatcher>,
}

impl EvmObserver {
	pub fn new(
		endpoint: &ChainEndpoint,
		dispatcher: Arc<AttestationDispatcher>,
	) -> Result<Self, ObserverError> {
		let address: Address = endpoint.contract_address.parse().map_err(|e| {
			ObserverError::config_error(format!(
				"{}: invalid contract address {}: {}",
				endpoint.slug, endpoint.contract_address, e
			))
		})?;

		Ok(Self {
			slug: endpoint.slug.clone(),
			address,
			decoder: EvmDecoder::new(endpoint.chain, address),
			profile: DispatchProfile::from(endpoint),
			dispatcher,
		})
	}

	pub fn address(&self) -> Address {
		self.address
	}

	/// Log subscription for this deployment.
	pub fn feed(&self) -> EvmLogFeed {
		EvmLogFeed::dlc_manager(self.address)
	}
}

#[async_trait]
impl NotificationHandler for EvmObserver {
	type Notification = EVMLog;

	fn name(&self) -> &str {
		&self.slug
	}

	async fn handle(&self, log: EVMLog) -> Result<usize, ObserverError> {
		match self.decoder.decode(&log) {
			Decoded::Event(event) => {
				self.dispatcher.dispatch(&self.profile, &event).await;
				Ok(1)
			}
			Decoded::Ignore(reason) => {
				tracing::debug!(
					observer = %self.slug,
					tx_id = ?log.transaction_hash,
					%reason,
					"log ignored"
				);
				Ok(0)
			}
		}
	}
}
