mod client;
mod feed;

pub use client::{DlcWrite, EvmClient, EvmClientTrait, EvmTxOutcome};
pub use feed::{dlc_event_topics, EvmLogFeed};
