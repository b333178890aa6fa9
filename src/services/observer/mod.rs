//! Chain observers.
//!
//! Each configured endpoint gets one observer. Raw notifications arrive from a
//! [`ReconnectSupervisor`](crate::services::blockchain::ReconnectSupervisor)
//! through a bounded channel and are drained by a single consumer loop
//! ([`consume`]), which decodes them and hands canonical events to the
//! [`AttestationDispatcher`](crate::services::attestation::AttestationDispatcher).
//!
//! A failing or panicking notification is logged and the loop moves on to
//! the next one.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

mod error;
mod evm;
mod service;
mod stacks;

pub use error::ObserverError;
pub use evm::EvmObserver;
pub use service::{ObserverReport, ObserverService};
pub use stacks::StacksObserver;

/// Processes the notifications of one observer
#[async_trait]
pub trait NotificationHandler: Send + Sync + 'static {
	type Notification: Send + 'static;

	/// Endpoint slug, used in log lines
	fn name(&self) -> &str;

	/// Handles one notification and returns how many events it dispatched.
	async fn handle(&self, notification: Self::Notification) -> Result<usize, ObserverError>;
}

/// Drains `notifications` until the channel closes or `shutdown` flips to
/// `true`.
///
/// # Returns
/// * `u64` - Number of notifications received
pub async fn consume<H: NotificationHandler>(
	handler: Arc<H>,
	mut notifications: mpsc::Receiver<H::Notification>,
	mut shutdown: watch::Receiver<bool>,
) -> u64 {
	let mut received = 0u64;
	loop {
		let notification = tokio::select! {
			biased;
			changed = shutdown.changed() => {
				if changed.is_err() || *shutdown.borrow() {
					tracing::info!(observer = handler.name(), "observer stopping");
					break;
				}
				continue;
			}
			next = notifications.recv() => match next {
				Some(notification) => notification,
				None => {
					tracing::info!(observer = handler.name(), "notification channel closed");
					break;
				}
			},
		};
		received += 1;

		let task_handler = handler.clone();
		let outcome =
			tokio::spawn(async move { task_handler.handle(notification).await }).await;
		match outcome {
			Ok(Ok(0)) => {}
			Ok(Ok(events)) => {
				tracing::debug!(observer = handler.name(), events, "notification dispatched")
			}
			Ok(Err(e)) => {
				tracing::warn!(observer = handler.name(), error = %e, "notification failed")
			}
			Err(e) => {
				tracing::error!(observer = handler.name(), error = %e, "notification handler panicked")
			}
		}
	}
	received
}
