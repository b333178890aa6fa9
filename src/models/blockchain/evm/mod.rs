//! EVM model definitions.
//!
//! The DLC manager contract is bound with `alloy::sol!`, which generates event
//! types that decode directly from raw logs and call builders for the write path.

mod contract;

pub use contract::DLCManager;

/// Raw log as delivered by an `eth_subscribe("logs")` notification
pub type EVMLog = alloy::rpc::types::Log;
