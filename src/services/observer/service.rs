//! Observer startup.
//!
//! EVM endpoints get a supervisor each. Stacks endpoints served by the same
//! API share one supervisor, which subscribes every contract address of the
//! group; a fan-out task copies its notifications to each observer's
//! channel.

use std::{
	collections::BTreeMap,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
};

use tokio::{
	sync::{mpsc, watch},
	task::JoinHandle,
};

use crate::{
	models::{AddressTxNotification, BlockChainType, ChainEndpoint},
	services::{
		attestation::AttestationDispatcher,
		blockchain::{ClientPoolTrait, ReconnectSupervisor, StacksAddressFeed, WsConfig},
		observer::{consume, EvmObserver, ObserverError, StacksObserver},
	},
};

/// Outcome of [`ObserverService::start`]
#[derive(Default)]
pub struct ObserverReport {
	/// Slugs of endpoints now observed
	pub started: Vec<String>,
	/// Endpoints that could not be observed, with the reason
	pub failed: Vec<(String, ObserverError)>,
	/// Consumer, fan-out and supervisor tasks
	pub tasks: Vec<JoinHandle<()>>,
}

pub struct ObserverService<P: ClientPoolTrait> {
	pool: Arc<P>,
	dispatcher: Arc<AttestationDispatcher>,
	ws_config: WsConfig,
	channel_capacity: usize,
	shutdown: watch::Receiver<bool>,
	started: AtomicBool,
}

impl<P: ClientPoolTrait + 'static> ObserverService<P> {
	pub fn new(
		pool: Arc<P>,
		dispatcher: Arc<AttestationDispatcher>,
		ws_config: WsConfig,
		channel_capacity: usize,
		shutdown: watch::Receiver<bool>,
	) -> Self {
		Self {
			pool,
			dispatcher,
			ws_config,
			channel_capacity: channel_capacity.max(1),
			shutdown,
			started: AtomicBool::new(false),
		}
	}

	/// Starts one observer per endpoint.
	///
	/// An endpoint that fails to start is reported and skipped; the others
	/// still start.
	///
	/// # Errors
	/// Returns [`ObserverError::AlreadyStarted`] on a second call.
	pub async fn start(&self, endpoints: &[ChainEndpoint]) -> Result<ObserverReport, ObserverError> {
		if self.started.swap(true, Ordering::SeqCst) {
			return Err(ObserverError::AlreadyStarted);
		}

		let mut report = ObserverReport::default();
		let mut stacks_groups: BTreeMap<String, Vec<&ChainEndpoint>> = BTreeMap::new();

		for endpoint in endpoints {
			match endpoint.family() {
				BlockChainType::EVM => match self.start_evm(endpoint) {
					Ok(mut tasks) => {
						report.tasks.append(&mut tasks);
						report.started.push(endpoint.slug.clone());
					}
					Err(e) => report.failed.push((endpoint.slug.clone(), e)),
				},
				BlockChainType::Stacks => stacks_groups
					.entry(endpoint.socket_url())
					.or_default()
					.push(endpoint),
			}
		}

		for (url, group) in stacks_groups {
			self.start_stacks_group(url, group, &mut report).await;
		}

		tracing::info!(
			started = report.started.len(),
			failed = report.failed.len(),
			"observers started"
		);
		Ok(report)
	}

	fn start_evm(&self, endpoint: &ChainEndpoint) -> Result<Vec<JoinHandle<()>>, ObserverError> {
		let observer = Arc::new(EvmObserver::new(endpoint, self.dispatcher.clone())?);
		let (tx, rx) = mpsc::channel(self.channel_capacity);
		let supervisor = ReconnectSupervisor::new(
			endpoint.socket_url(),
			observer.feed(),
			self.ws_config.clone(),
			tx,
		);

		tracing::info!(
			observer = %endpoint.slug,
			chain = %endpoint.chain,
			address = %observer.address(),
			"starting EVM observer"
		);

		let shutdown = self.shutdown.clone();
		Ok(vec![
			tokio::spawn(supervisor.run()),
			tokio::spawn(async move {
				consume(observer, rx, shutdown).await;
			}),
		])
	}

	async fn start_stacks_group(
		&self,
		url: String,
		group: Vec<&ChainEndpoint>,
		report: &mut ObserverReport,
	) {
		let mut sinks = Vec::new();
		let mut addresses = Vec::new();

		for endpoint in group {
			let client = match self.pool.get_stacks_client(endpoint).await {
				Ok(client) => client,
				Err(e) => {
					report
						.failed
						.push((endpoint.slug.clone(), ObserverError::from(e)));
					continue;
				}
			};
			let observer = Arc::new(StacksObserver::new(endpoint, client, self.dispatcher.clone()));
			let (tx, rx) = mpsc::channel(self.channel_capacity);

			tracing::info!(
				observer = %endpoint.slug,
				chain = %endpoint.chain,
				address = %observer.address(),
				"starting Stacks observer"
			);

			addresses.push(observer.address().to_string());
			sinks.push(tx);
			let shutdown = self.shutdown.clone();
			report.tasks.push(tokio::spawn(async move {
				consume(observer, rx, shutdown).await;
			}));
			report.started.push(endpoint.slug.clone());
		}

		if sinks.is_empty() {
			return;
		}

		let (tx, rx) = mpsc::channel(self.channel_capacity);
		let supervisor = ReconnectSupervisor::new(
			url,
			StacksAddressFeed::new(addresses),
			self.ws_config.clone(),
			tx,
		);
		report.tasks.push(tokio::spawn(supervisor.run()));
		report
			.tasks
			.push(tokio::spawn(fan_out(rx, sinks, self.shutdown.clone())));
	}
}

/// Copies every notification of a shared feed to each observer.
async fn fan_out(
	mut upstream: mpsc::Receiver<AddressTxNotification>,
	mut sinks: Vec<mpsc::Sender<AddressTxNotification>>,
	mut shutdown: watch::Receiver<bool>,
) {
	loop {
		let notification = tokio::select! {
			biased;
			changed = shutdown.changed() => {
				if changed.is_err() || *shutdown.borrow() {
					return;
				}
				continue;
			}
			next = upstream.recv() => match next {
				Some(notification) => notification,
				None => return,
			},
		};

		for sink in &sinks {
			if sink.send(notification.clone()).await.is_err() {
				tracing::debug!("observer channel closed");
			}
		}
		sinks.retain(|sink| !sink.is_closed());
		if sinks.is_empty() {
			return;
		}
	}
}
