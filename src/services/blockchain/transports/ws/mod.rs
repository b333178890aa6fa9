//! WebSocket subscription feeds.

mod config;
mod connection;
mod supervisor;

pub use config::WsConfig;
pub use connection::ConnectionHealth;
pub use supervisor::{FeedMessage, FeedProtocol, ReconnectSupervisor, SubscriptionState};
