//! Blockchain client implementations.
//!
//! - EVM client: alloy provider bound to one DLC manager deployment
//! - Stacks client: REST access to the node and extended API
//!
//! Each family also defines the [`FeedProtocol`](super::FeedProtocol) its
//! observer subscribes with.

mod evm;
mod stacks;

pub use evm::{dlc_event_topics, DlcWrite, EvmClient, EvmClientTrait, EvmLogFeed, EvmTxOutcome};
pub use stacks::{IndexingRetry, StacksAddressFeed, StacksClient, StacksClientTrait};
