//! WebSocket configuration for subscription feeds
//!
//! Heartbeat, connect timeout, watchdog period and reconnect backoff of a
//! supervised feed.

use std::time::Duration;

use crate::utils::BackoffConfig;

/// WebSocket configuration for subscription feeds
#[derive(Clone, Debug)]
pub struct WsConfig {
	/// How often to send keep-alive pings. A connection with no traffic for
	/// two intervals is treated as dead.
	pub heartbeat_interval: Duration,
	/// How long to wait for the socket handshake
	pub connection_timeout: Duration,
	/// How often the watchdog checks for a disconnected feed
	pub watchdog_interval: Duration,
	/// Delay between reconnect attempts
	pub backoff: BackoffConfig,
}

impl Default for WsConfig {
	fn default() -> Self {
		Self {
			heartbeat_interval: Duration::from_secs(30),
			connection_timeout: Duration::from_secs(10),
			watchdog_interval: Duration::from_secs(2),
			backoff: BackoffConfig::default(),
		}
	}
}

impl WsConfig {
	/// Creates a new WebSocket configuration with default values
	pub fn new() -> Self {
		Self::default()
	}

	/// Short timings for tests against a local server
	pub fn fast() -> Self {
		Self {
			heartbeat_interval: Duration::from_secs(5),
			connection_timeout: Duration::from_secs(1),
			watchdog_interval: Duration::from_millis(100),
			backoff: BackoffConfig {
				floor: Duration::from_millis(50),
				ceiling: Duration::from_millis(200),
			},
		}
	}

	/// Sets the heartbeat interval
	///
	/// # Arguments
	/// * `heartbeat_interval` - The heartbeat interval to set
	///
	/// # Returns
	/// * `WsConfig` - A new WebSocket configuration with the updated heartbeat interval
	pub fn with_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
		self.heartbeat_interval = heartbeat_interval;
		self
	}

	/// Sets the connection timeout
	///
	/// # Arguments
	/// * `connection_timeout` - The connection timeout to set
	///
	/// # Returns
	/// * `WsConfig` - A new WebSocket configuration with the updated connection timeout
	pub fn with_connection_timeout(mut self, connection_timeout: Duration) -> Self {
		self.connection_timeout = connection_timeout;
		self
	}

	/// Sets the watchdog interval
	pub fn with_watchdog_interval(mut self, watchdog_interval: Duration) -> Self {
		self.watchdog_interval = watchdog_interval;
		self
	}

	/// Sets the reconnect backoff floor and ceiling
	pub fn with_backoff(mut self, floor: Duration, ceiling: Duration) -> Self {
		self.backoff = BackoffConfig { floor, ceiling };
		self
	}

	/// Builds the WebSocket configuration
	pub fn build(self) -> Self {
		self
	}
}
