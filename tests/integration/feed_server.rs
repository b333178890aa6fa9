//! Scripted JSON-RPC websocket server.
//!
//! Each accepted connection reads `subscriptions` text frames, reports them,
//! sends the scripted frames for that connection and then either holds the
//! socket open or closes it.

use std::time::Duration;

use dlc_observer::{services::blockchain::WsConfig, utils::BackoffConfig};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{net::TcpListener, sync::mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Script of one accepted connection
pub struct Session {
	pub frames: Vec<String>,
	pub close_after: bool,
}

/// Starts the server and returns its URL and the subscription requests it
/// received, tagged with the connection number.
pub async fn start(
	subscriptions: usize,
	sessions: Vec<Session>,
) -> (String, mpsc::UnboundedReceiver<(usize, Value)>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let url = format!("ws://{}", listener.local_addr().unwrap());
	let (requests_tx, requests_rx) = mpsc::unbounded_channel();

	tokio::spawn(async move {
		for (connection, session) in sessions.into_iter().enumerate() {
			let Ok((stream, _)) = listener.accept().await else {
				return;
			};
			let Ok(mut ws) = accept_async(stream).await else {
				continue;
			};

			let mut received = 0;
			while received < subscriptions {
				match ws.next().await {
					Some(Ok(Message::Text(text))) => {
						received += 1;
						if let Ok(request) = serde_json::from_str::<Value>(text.as_str()) {
							let _ = requests_tx.send((connection, request));
						}
					}
					Some(Ok(_)) => {}
					_ => break,
				}
			}

			for frame in session.frames {
				if ws.send(Message::Text(frame.into())).await.is_err() {
					break;
				}
			}

			if session.close_after {
				let _ = ws.close(None).await;
			} else {
				tokio::spawn(async move { while let Some(Ok(_)) = ws.next().await {} });
			}
		}
	});

	(url, requests_rx)
}

/// Supervisor settings that reconnect quickly
pub fn fast_config() -> WsConfig {
	WsConfig {
		heartbeat_interval: Duration::from_secs(30),
		connection_timeout: Duration::from_secs(5),
		watchdog_interval: Duration::from_millis(100),
		backoff: BackoffConfig {
			floor: Duration::from_millis(50),
			ceiling: Duration::from_millis(200),
		},
	}
}
