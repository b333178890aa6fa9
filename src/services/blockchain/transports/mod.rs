//! Network transport implementations for blockchain clients.
//!
//! Both chain families deliver contract activity over a JSON-RPC websocket:
//! EVM nodes through `eth_subscribe`, the Stacks API through its
//! `address_tx_update` feed. [`ws::ReconnectSupervisor`] keeps either one
//! connected.

mod ws;

pub use ws::{
	ConnectionHealth, FeedMessage, FeedProtocol, ReconnectSupervisor, SubscriptionState, WsConfig,
};
