//! WebSocket connection health tracking
//!
//! A supervised session records every inbound frame; the heartbeat uses the
//! idle time to detect connections that died without a close frame.

use std::time::{Duration, Instant};

/// Activity record of one live session
#[derive(Debug)]
pub struct ConnectionHealth {
	last_activity: Instant,
	frames: u64,
}

impl Default for ConnectionHealth {
	fn default() -> Self {
		Self {
			last_activity: Instant::now(),
			frames: 0,
		}
	}
}

impl ConnectionHealth {
	/// Records an inbound frame
	pub fn update_activity(&mut self) {
		self.last_activity = Instant::now();
		self.frames += 1;
	}

	/// Whether nothing arrived within `max_idle`
	pub fn is_stale(&self, max_idle: Duration) -> bool {
		self.last_activity.elapsed() > max_idle
	}

	pub fn frames(&self) -> u64 {
		self.frames
	}
}
