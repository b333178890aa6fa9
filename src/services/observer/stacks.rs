//! Stacks observer.
//!
//! Address notifications only say that a transaction touched the contract.
//! Successful, anchored transactions with at least one event are fetched in
//! full from the API and their print events decoded.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
	models::{
		blockchain::stacks::TX_STATUS_SUCCESS, AddressTxNotification, ChainEndpoint, Decoded,
		IgnoreReason,
	},
	services::{
		attestation::{AttestationDispatcher, DispatchProfile},
		blockchain::StacksClientTrait,
		decoder::StacksDecoder,
		observer::{NotificationHandler, ObserverError},
	},
};

/// Observes one Stacks DLC manager through a shared address feed
pub struct StacksObserver<C: StacksClientTrait> {
	slug: String,
	client: Arc<C>,
	decoder: StacksDecoder,
	profile: DispatchProfile,
	dispatcher: Arc<AttestationDispatcher>,
}

impl<C: StacksClientTrait> StacksObserver<C> {
	pub fn new(endpoint: &ChainEndpoint, client: Arc<C>, dispatcher: Arc<AttestationDispatcher>) -> Self {
		Self {
			slug: endpoint.slug.clone(),
			client,
			decoder: StacksDecoder::new(endpoint.chain, endpoint.contract_identifier()),
			profile: DispatchProfile::from(endpoint),
			dispatcher,
		}
	}

	/// Contract principal this observer subscribes to.
	pub fn address(&self) -> &str {
		self.decoder.contract_identifier()
	}

	/// Checks a notification before anything is fetched.
	fn prefilter(&self, notification: &AddressTxNotification) -> Result<(), IgnoreReason> {
		if notification.address != self.address() {
			return Err(IgnoreReason::OtherContract(notification.address.clone()));
		}

		match notification.tx.as_ref() {
			Some(summary) => {
				if !summary.is_success() {
					return Err(IgnoreReason::NotSuccessful(summary.tx_status.clone()));
				}
				if summary.is_unanchored {
					return Err(IgnoreReason::NotFinal);
				}
				if summary.event_count < 1 {
					return Err(IgnoreReason::NoEvents);
				}
				Ok(())
			}
			None if notification.tx_status != TX_STATUS_SUCCESS => {
				Err(IgnoreReason::NotSuccessful(notification.tx_status.clone()))
			}
			None => Ok(()),
		}
	}
}

#[async_trait]
impl<C: StacksClientTrait + 'static> NotificationHandler for StacksObserver<C> {
	type Notification = AddressTxNotification;

	fn name(&self) -> &str {
		&self.slug
	}

	async fn handle(&self, notification: AddressTxNotification) -> Result<usize, ObserverError> {
		if let Err(reason) = self.prefilter(&notification) {
			tracing::debug!(observer = %self.slug, tx_id = %notification.tx_id, %reason, "notification skipped");
			return Ok(0);
		}

		let detail = self.client.get_transaction(&notification.tx_id).await?;
		if detail.event_count < 1 {
			tracing::debug!(observer = %self.slug, tx_id = %detail.tx_id, "transaction has no events");
			return Ok(0);
		}

		let mut dispatched = 0;
		for decoded in self.decoder.decode(&detail) {
			match decoded {
				Decoded::Event(event) => {
					self.dispatcher.dispatch(&self.profile, &event).await;
					dispatched += 1;
				}
				Decoded::Ignore(reason) => {
					tracing::debug!(observer = %self.slug, tx_id = %detail.tx_id, %reason, "print ignored")
				}
			}
		}
		Ok(dispatched)
	}
}
