//! DLC observer entry point.
//!
//! Watches the DLC manager contracts configured under the chains directory,
//! forwards lifecycle events to the attestor and exposes the administrative
//! API used to write back to the contracts.
//!
//! # Flow
//! 1. Loads process settings and endpoint configuration files
//! 2. Builds one broadcaster per chain with a signing endpoint
//! 3. Starts one observer per observed endpoint
//! 4. Serves the administrative API
//! 5. Handles graceful shutdown on Ctrl+C

use std::{
	env::{set_var, var},
	sync::Arc,
	time::Duration,
};

use clap::{Arg, ArgMatches, Command};
use dotenvy::dotenv;
use tokio::sync::watch;
use tracing::{error, info, warn};

use dlc_observer::{
	bootstrap::{build_writers, create_attestor, report_failures},
	models::ServiceConfig,
	repositories::{EndpointRepository, EndpointService},
	services::{
		api::{create_api_server, ApiState},
		attestation::AttestationDispatcher,
		blockchain::{ClientPool, WsConfig},
		observer::ObserverService,
	},
	utils::{create_http_client, logging::setup_logging, HttpRetryConfig},
};

/// How long observer tasks get to finish after the shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn cli() -> Command {
	Command::new("dlc-observer")
		.version(env!("CARGO_PKG_VERSION"))
		.about(
			"Observes DLC manager contracts on EVM and Stacks chains and relays their lifecycle \
			 events to an attestor.",
		)
		.arg(
			Arg::new("log-file")
				.long("log-file")
				.help("Write logs to file instead of stdout")
				.action(clap::ArgAction::SetTrue),
		)
		.arg(
			Arg::new("log-level")
				.long("log-level")
				.help("Set log level (trace, debug, info, warn, error)")
				.value_name("LEVEL"),
		)
		.arg(
			Arg::new("log-path")
				.long("log-path")
				.help("Path to store log files (default: logs/)")
				.value_name("PATH"),
		)
		.arg(
			Arg::new("config-dir")
				.long("config-dir")
				.help("Directory of endpoint configuration files (default: config/chains)")
				.value_name("PATH"),
		)
		.arg(
			Arg::new("api-address")
				.long("api-address")
				.help("Address to serve the administrative API on (default: 127.0.0.1:3000)")
				.value_name("HOST:PORT"),
		)
		.arg(
			Arg::new("no-api")
				.long("no-api")
				.help("Do not start the administrative API")
				.action(clap::ArgAction::SetTrue),
		)
}

/// Copies CLI options into the environment. Variables that are already set
/// win over the command line.
fn apply_cli_to_env(matches: &ArgMatches) {
	let set_if_unset = |key: &str, value: &str| {
		if var(key).is_err() {
			set_var(key, value);
		}
	};

	if matches.get_flag("log-file") {
		set_if_unset("LOG_MODE", "file");
	}
	if matches.get_flag("no-api") {
		set_if_unset("API_DISABLED", "true");
	}
	for (arg, key) in [
		("log-level", "LOG_LEVEL"),
		("log-path", "LOG_DATA_DIR"),
		("config-dir", "CHAINS_CONFIG_DIR"),
		("api-address", "API_BIND_ADDRESS"),
	] {
		if let Some(value) = matches.get_one::<String>(arg) {
			set_if_unset(key, value);
		}
	}
}

/// Main entry point for the observer service.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or the API server
/// cannot bind.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let matches = cli().get_matches();

	// Load environment variables from .env file
	dotenv().ok();
	apply_cli_to_env(&matches);

	let _log_guard = setup_logging().unwrap_or_else(|e| {
		eprintln!("Failed to setup logging: {}", e);
		None
	});

	let config = ServiceConfig::from_env()
		.map_err(|e| anyhow::anyhow!("Failed to read service settings: {}", e))?;
	let endpoints = EndpointService::<EndpointRepository>::new(Some(config.chains_dir.as_path())).map_err(|e| {
		anyhow::anyhow!(
			"Failed to load endpoints from {}: {}",
			config.chains_dir.display(),
			e
		)
	})?;
	report_failures("config", &endpoints.rejected());

	let http = create_http_client(config.http_timeout, &HttpRetryConfig::default())?;
	let pool = Arc::new(ClientPool::new(http.clone()));
	let attestor = create_attestor(&config, http);

	let writers = build_writers(&endpoints, pool.as_ref()).await;
	report_failures("broadcaster", &writers.failed);

	let (shutdown_tx, shutdown_rx) = watch::channel(false);

	let mut observed = Vec::new();
	let mut observer_tasks = Vec::new();
	match &attestor {
		Some(attestor) => {
			let dispatcher = Arc::new(AttestationDispatcher::new(
				attestor.clone(),
				config.default_maturation_offset,
			));
			let observers = ObserverService::new(
				pool.clone(),
				dispatcher,
				WsConfig::default(),
				config.channel_capacity,
				shutdown_rx,
			);
			let report = observers.start(&endpoints.observed()).await?;
			for (slug, e) in &report.failed {
				error!(endpoint = %slug, error = %e, "observer not started");
			}
			observed = report.started;
			observer_tasks = report.tasks;
		}
		None => error!("ATTESTOR_URL is not set, no endpoint will be observed"),
	}

	if observed.is_empty() && writers.contracts.chains().is_empty() {
		warn!("No endpoint is observed or written to");
	}

	let api_server = if config.api_enabled {
		let mut state = ApiState::new(writers.contracts)
			.with_attestor_list(config.attestor_list.clone())
			.with_test_mode(config.test_mode)
			.with_observed(observed.clone());
		if let Some(attestor) = attestor {
			state = state.with_attestor(attestor);
		}
		Some(create_api_server(&config.api_bind_address, state)?)
	} else {
		info!("Administrative API disabled");
		None
	};

	info!(observed = observed.len(), "Service started. Press Ctrl+C to shutdown");

	let ctrl_c = tokio::signal::ctrl_c();
	if let Some(server) = api_server {
		let handle = server.handle();
		tokio::select! {
			result = ctrl_c => {
				if let Err(e) = result {
					error!("Error waiting for Ctrl+C: {}", e);
				}
				info!("Shutdown signal received, stopping services...");
			}
			result = server => {
				if let Err(e) = result {
					error!("API server error: {}", e);
				}
				info!("API server stopped, shutting down services...");
			}
		}
		handle.stop(true).await;
	} else {
		let _ = ctrl_c.await;
		info!("Shutdown signal received, stopping services...");
	}

	let _ = shutdown_tx.send(true);
	if tokio::time::timeout(SHUTDOWN_GRACE, futures::future::join_all(observer_tasks))
		.await
		.is_err()
	{
		warn!("Observers did not stop within {:?}", SHUTDOWN_GRACE);
	}

	info!("Shutdown complete");
	Ok(())
}
