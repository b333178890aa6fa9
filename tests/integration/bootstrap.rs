//! Configuration directory to running broadcasters.

use std::{fs, time::Duration};

use dlc_observer::{
	bootstrap::build_writers,
	models::{ChainTag, EvmNetwork},
	repositories::{EndpointRepository, EndpointService},
	services::blockchain::ClientPool,
	utils::{create_http_client, HttpRetryConfig},
};
use serde_json::json;
use tempfile::TempDir;

const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn write(dir: &TempDir, name: &str, contents: &str) {
	fs::write(dir.path().join(name), contents).unwrap();
}

#[tokio::test]
async fn test_config_dir_to_writers() {
	let dir = TempDir::new().unwrap();
	write(
		&dir,
		"evm_localhost_v1.json",
		&json!({
			"slug": "evm_localhost_v1",
			"chain": "evm-localhost",
			"version": "1",
			"contract_address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
			"endpoint": "ws://127.0.0.1:8545",
			"write_endpoint": "http://127.0.0.1:8545",
			"signing_key_env": "EVM_LOCALHOST_KEY",
			"precision_shift": 2
		})
		.to_string(),
	);
	write(
		&dir,
		"stx_testnet_v1.json",
		&json!({
			"slug": "stx_testnet_v1",
			"chain": "stx-testnet",
			"version": "1",
			"contract_address": "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM",
			"endpoint": "wss://api.testnet.hiro.so",
			"signing_key_env": "STX_TESTNET_KEY",
			"wallet_address": "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG"
		})
		.to_string(),
	);
	write(&dir, "broken.json", "{ \"slug\": ");
	write(&dir, "notes.txt", "not an endpoint");

	let repository = EndpointRepository::new_with_lookup(Some(dir.path()), |key| {
		(key == "EVM_LOCALHOST_KEY").then(|| ANVIL_KEY.to_string())
	})
	.unwrap();
	let endpoints = EndpointService::new_with_repository(repository).unwrap();

	let rejected = endpoints.rejected();
	assert_eq!(rejected.len(), 1);
	assert_eq!(rejected[0].0, "stx_testnet_v1");
	assert!(rejected[0].1.contains("STX_TESTNET_KEY"));

	let observed: Vec<String> = endpoints.observed().into_iter().map(|e| e.slug).collect();
	assert_eq!(observed, vec!["evm_localhost_v1".to_string()]);

	let http = create_http_client(Duration::from_secs(1), &HttpRetryConfig::default()).unwrap();
	let writers = build_writers(&endpoints, &ClientPool::new(http)).await;

	let localhost = ChainTag::Evm(EvmNetwork::Localhost);
	assert_eq!(writers.contracts.chains(), vec![localhost]);
	assert!(writers.nonces.has_source(&localhost));
	assert!(writers.failed.is_empty());
}
