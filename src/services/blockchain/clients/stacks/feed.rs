//! Stacks API websocket feed.
//!
//! The extended API serves JSON-RPC over `/extended/v1/ws`. Each contract
//! principal of interest gets an `address_tx_update` subscription.

use serde_json::{json, Value};

use crate::{
	models::AddressTxNotification,
	services::blockchain::transports::{FeedMessage, FeedProtocol},
};

const ADDRESS_TX_UPDATE: &str = "address_tx_update";

/// Address transaction subscriptions for one socket
#[derive(Debug, Clone)]
pub struct StacksAddressFeed {
	addresses: Vec<String>,
}

impl StacksAddressFeed {
	pub fn new(addresses: Vec<String>) -> Self {
		Self { addresses }
	}

	pub fn addresses(&self) -> &[String] {
		&self.addresses
	}
}

impl FeedProtocol for StacksAddressFeed {
	type Notification = AddressTxNotification;

	fn label(&self) -> &str {
		"stacks"
	}

	fn subscriptions(&self) -> Vec<(String, Value)> {
		self.addresses
			.iter()
			.map(|address| {
				(
					"subscribe".to_string(),
					json!({ "event": ADDRESS_TX_UPDATE, "address": address }),
				)
			})
			.collect()
	}

	fn parse(&self, text: &str) -> FeedMessage<AddressTxNotification> {
		let message: Value = match serde_json::from_str(text) {
			Ok(message) => message,
			Err(e) => {
				tracing::warn!(error = %e, "unparseable stacks socket frame");
				return FeedMessage::Ignored;
			}
		};

		if let Some(error) = message.get("error") {
			return FeedMessage::Error(error.to_string());
		}

		if message.get("method").and_then(Value::as_str) != Some(ADDRESS_TX_UPDATE) {
			return FeedMessage::Ignored;
		}

		match message
			.get("params")
			.cloned()
			.map(serde_json::from_value::<AddressTxNotification>)
		{
			Some(Ok(notification)) => FeedMessage::Notification(notification),
			Some(Err(e)) => {
				tracing::warn!(error = %e, "malformed address_tx_update");
				FeedMessage::Ignored
			}
			None => FeedMessage::Ignored,
		}
	}
}
