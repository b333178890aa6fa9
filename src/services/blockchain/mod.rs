//! Blockchain client interfaces and implementations.
//!
//! Provides abstractions and concrete implementations for talking to the two
//! supported chain families. Includes:
//!
//! - EVM and Stacks clients
//! - The reconnecting websocket transport and its feed protocols
//! - Error handling for blockchain operations
//! - Client pool for sharing clients between observers and broadcasters

mod clients;
mod error;
mod pool;
mod transports;

pub use clients::{
	dlc_event_topics, DlcWrite, EvmClient, EvmClientTrait, EvmLogFeed, EvmTxOutcome,
	IndexingRetry, StacksAddressFeed, StacksClient, StacksClientTrait,
};
pub use error::BlockChainError;
pub use pool::{ClientPool, ClientPoolTrait, ClientStorage};
pub use transports::{
	ConnectionHealth, FeedMessage, FeedProtocol, ReconnectSupervisor, SubscriptionState, WsConfig,
};
