//! Reconnect backoff.
//!
//! Socket feeds retry forever: the delay doubles from a floor up to a ceiling
//! and stays there until a connection succeeds and the backoff is reset.

use std::time::Duration;

/// Configuration for backoff behavior
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
	/// Delay before the first retry
	pub floor: Duration,

	/// The doubling delay never exceeds this
	pub ceiling: Duration,
}

impl Default for BackoffConfig {
	/// 1 second floor, 5 second ceiling
	fn default() -> Self {
		Self {
			floor: Duration::from_secs(1),
			ceiling: Duration::from_secs(5),
		}
	}
}

/// Stateful delay generator with no attempt limit
#[derive(Debug, Clone)]
pub struct Backoff {
	config: BackoffConfig,
	attempt: u32,
}

impl Backoff {
	pub fn new(config: BackoffConfig) -> Self {
		Self { config, attempt: 0 }
	}

	/// Delay to wait before the next attempt.
	pub fn next_delay(&mut self) -> Duration {
		let factor = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
		let delay = self
			.config
			.floor
			.checked_mul(factor)
			.unwrap_or(self.config.ceiling)
			.min(self.config.ceiling);
		self.attempt = self.attempt.saturating_add(1);
		delay
	}

	/// Attempts since the last reset.
	pub fn attempts(&self) -> u32 {
		self.attempt
	}

	/// Back to the floor after a successful connection.
	pub fn reset(&mut self) {
		self.attempt = 0;
	}
}
