//! EVM log subscription over `eth_subscribe`.

use alloy::{
	primitives::{Address, B256},
	sol_types::SolEvent,
};
use serde_json::{json, Value};

use crate::{
	models::{DLCManager, EVMLog},
	services::blockchain::transports::{FeedMessage, FeedProtocol},
};

/// Topic0 of every DLC manager event the observer decodes
pub fn dlc_event_topics() -> Vec<B256> {
	vec![
		DLCManager::CreateDLC::SIGNATURE_HASH,
		DLCManager::SetStatusFunded::SIGNATURE_HASH,
		DLCManager::CloseDLC::SIGNATURE_HASH,
		DLCManager::PostCloseDLC::SIGNATURE_HASH,
	]
}

/// `logs` subscription for one contract
#[derive(Debug, Clone)]
pub struct EvmLogFeed {
	address: Address,
	topics: Vec<B256>,
}

impl EvmLogFeed {
	pub fn new(address: Address, topics: Vec<B256>) -> Self {
		Self { address, topics }
	}

	/// Subscription to every DLC manager event emitted by `address`.
	pub fn dlc_manager(address: Address) -> Self {
		Self::new(address, dlc_event_topics())
	}
}

impl FeedProtocol for EvmLogFeed {
	type Notification = EVMLog;

	fn label(&self) -> &str {
		"evm"
	}

	fn subscriptions(&self) -> Vec<(String, Value)> {
		vec![(
			"eth_subscribe".to_string(),
			json!([
				"logs",
				{ "address": format!("{:#x}", self.address), "topics": [self.topics] }
			]),
		)]
	}

	fn parse(&self, text: &str) -> FeedMessage<EVMLog> {
		let message: Value = match serde_json::from_str(text) {
			Ok(message) => message,
			Err(e) => {
				tracing::warn!(error = %e, "unparseable evm socket frame");
				return FeedMessage::Ignored;
			}
		};

		if let Some(error) = message.get("error") {
			return FeedMessage::Error(error.to_string());
		}

		if message.get("method").and_then(Value::as_str) != Some("eth_subscription") {
			return FeedMessage::Ignored;
		}

		match message
			.pointer("/params/result")
			.cloned()
			.map(serde_json::from_value::<EVMLog>)
		{
			Some(Ok(log)) => FeedMessage::Notification(log),
			Some(Err(e)) => {
				tracing::warn!(error = %e, "malformed log notification");
				FeedMessage::Ignored
			}
			None => FeedMessage::Ignored,
		}
	}
}
