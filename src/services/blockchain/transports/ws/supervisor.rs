//! Reconnecting subscription feed.
//!
//! A [`ReconnectSupervisor`] owns one socket URL and keeps it subscribed for
//! the life of the process:
//!
//! - `Disconnected -> Connecting` is a compare-and-set, so redundant `connect`
//!   calls (watchdog and backoff loop racing) are no-ops
//! - every successful connect re-sends all subscription requests
//! - failed attempts back off between the configured floor and ceiling with
//!   no attempt limit
//! - a watchdog re-issues `connect` whenever it finds the feed disconnected
//!
//! What to subscribe to and how to read notifications is delegated to a
//! [`FeedProtocol`]; parsed notifications go into a bounded channel.

use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{
	net::TcpStream,
	sync::{mpsc, watch, Mutex},
	time::{timeout, MissedTickBehavior},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::{
	services::blockchain::transports::ws::{config::WsConfig, connection::ConnectionHealth},
	utils::Backoff,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection state of one supervised feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
	Disconnected,
	Connecting,
	Subscribed,
}

/// What a feed protocol made of one text frame
#[derive(Debug, PartialEq)]
pub enum FeedMessage<N> {
	Notification(N),
	/// Acknowledgements and anything else not worth forwarding
	Ignored,
	/// The server refused a request; the session is restarted
	Error(String),
}

/// JSON-RPC dialect spoken over a supervised socket
pub trait FeedProtocol: Send + Sync + 'static {
	type Notification: Send + 'static;

	/// Short name used in log lines
	fn label(&self) -> &str;

	/// `(method, params)` of every subscription, sent on each connect
	fn subscriptions(&self) -> Vec<(String, Value)>;

	fn parse(&self, text: &str) -> FeedMessage<Self::Notification>;
}

pub struct ReconnectSupervisor<P: FeedProtocol> {
	url: String,
	protocol: P,
	config: WsConfig,
	state: watch::Sender<SubscriptionState>,
	sink: mpsc::Sender<P::Notification>,
	backoff: Mutex<Backoff>,
	request_id_counter: AtomicU64,
	sessions: AtomicU64,
}

impl<P: FeedProtocol> ReconnectSupervisor<P> {
	pub fn new(
		url: impl Into<String>,
		protocol: P,
		config: WsConfig,
		sink: mpsc::Sender<P::Notification>,
	) -> Arc<Self> {
		let (state, _) = watch::channel(SubscriptionState::Disconnected);
		let backoff = Mutex::new(Backoff::new(config.backoff.clone()));
		Arc::new(Self {
			url: url.into(),
			protocol,
			config,
			state,
			sink,
			backoff,
			request_id_counter: AtomicU64::new(1),
			sessions: AtomicU64::new(0),
		})
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn state(&self) -> SubscriptionState {
		*self.state.borrow()
	}

	/// Receiver that observes every state change
	pub fn watch_state(&self) -> watch::Receiver<SubscriptionState> {
		self.state.subscribe()
	}

	/// Number of sessions that reached `Subscribed`
	pub fn sessions(&self) -> u64 {
		self.sessions.load(Ordering::SeqCst)
	}

	fn begin_connect(&self) -> bool {
		self.state.send_if_modified(|state| {
			if *state == SubscriptionState::Disconnected {
				*state = SubscriptionState::Connecting;
				true
			} else {
				false
			}
		})
	}

	fn set_state(&self, next: SubscriptionState) {
		self.state.send_replace(next);
	}

	/// Starts a connect cycle unless one is already running.
	///
	/// # Returns
	/// * `bool` - Whether this call started the cycle
	pub fn connect(self: &Arc<Self>) -> bool {
		if !self.begin_connect() {
			return false;
		}
		tokio::spawn(Arc::clone(self).maintain());
		true
	}

	/// Connects and then watches the feed until the notification receiver is
	/// dropped.
	pub async fn run(self: Arc<Self>) {
		self.connect();

		let mut watchdog = tokio::time::interval(self.config.watchdog_interval);
		watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);
		loop {
			watchdog.tick().await;
			if self.sink.is_closed() {
				tracing::debug!(feed = self.protocol.label(), "receiver dropped, stopping watchdog");
				break;
			}
			if self.state() == SubscriptionState::Disconnected {
				tracing::info!(feed = self.protocol.label(), url = %self.url, "attempting to reconnect");
				self.connect();
			}
		}
	}

	async fn maintain(self: Arc<Self>) {
		loop {
			match self.open().await {
				Ok(stream) => {
					self.backoff.lock().await.reset();
					match self.session(stream).await {
						Ok(()) => {
							tracing::info!(feed = self.protocol.label(), "connection closed")
						}
						Err(e) => tracing::warn!(
							feed = self.protocol.label(),
							error = %e,
							"connection lost"
						),
					}
				}
				Err(e) => {
					tracing::warn!(feed = self.protocol.label(), url = %self.url, error = %e, "connect failed")
				}
			}

			self.set_state(SubscriptionState::Disconnected);
			if self.sink.is_closed() {
				return;
			}

			let delay = self.backoff.lock().await.next_delay();
			tokio::time::sleep(delay).await;

			// the watchdog may have started a newer cycle while we slept
			if !self.begin_connect() {
				return;
			}
		}
	}

	async fn open(&self) -> Result<WsStream, anyhow::Error> {
		let (stream, _) = timeout(self.config.connection_timeout, connect_async(self.url.as_str()))
			.await
			.map_err(|_| anyhow::anyhow!("connect timed out"))?
			.map_err(|e| anyhow::anyhow!("failed to connect: {}", e))?;
		Ok(stream)
	}

	async fn session(&self, stream: WsStream) -> Result<(), anyhow::Error> {
		let (mut write, mut read) = stream.split();

		for (method, params) in self.protocol.subscriptions() {
			let request_id = self.request_id_counter.fetch_add(1, Ordering::SeqCst);
			let body = json!({
				"jsonrpc": "2.0",
				"id": request_id,
				"method": method,
				"params": params,
			});
			write.send(Message::Text(body.to_string().into())).await?;
		}

		self.set_state(SubscriptionState::Subscribed);
		self.sessions.fetch_add(1, Ordering::SeqCst);
		tracing::info!(feed = self.protocol.label(), url = %self.url, "subscribed");

		let mut health = ConnectionHealth::default();
		let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval);
		heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
		heartbeat.tick().await;

		loop {
			tokio::select! {
				frame = read.next() => {
					let frame = match frame {
						None => return Ok(()),
						Some(frame) => frame?,
					};
					health.update_activity();
					match frame {
						Message::Text(text) => match self.protocol.parse(text.as_str()) {
							FeedMessage::Notification(notification) => {
								if self.sink.send(notification).await.is_err() {
									return Ok(());
								}
							}
							FeedMessage::Ignored => {}
							FeedMessage::Error(msg) => {
								return Err(anyhow::anyhow!("subscription rejected: {}", msg));
							}
						},
						Message::Ping(data) => write.send(Message::Pong(data)).await?,
						Message::Close(_) => return Ok(()),
						_ => {}
					}
				}
				_ = heartbeat.tick() => {
					if health.is_stale(self.config.heartbeat_interval * 2) {
						return Err(anyhow::anyhow!("no traffic for two heartbeat intervals"));
					}
					write.send(Message::Ping(Vec::new().into())).await?;
				}
			}
		}
	}
}
