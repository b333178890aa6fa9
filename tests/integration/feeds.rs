//! Supervised feeds against a local websocket server.

use std::{sync::Arc, time::Duration};

use alloy::{
	primitives::{address, Address, FixedBytes, U256},
	sol_types::SolEvent,
};
use dlc_observer::{
	models::{
		ChainEndpoint, ChainTag, ContractId, DLCManager, EVMLog, EvmNetwork, DEFAULT_GAS_MARGIN,
		DEFAULT_STACKS_FEE,
	},
	services::{
		attestation::{Attestation, AttestationDispatcher},
		blockchain::{ReconnectSupervisor, StacksAddressFeed, SubscriptionState},
		observer::{consume, EvmObserver},
	},
};
use serde_json::json;
use tokio::{
	sync::{mpsc, watch},
	time::timeout,
};

use crate::integration::{
	feed_server::{self, Session},
	mocks::{allow_event_readback, MockAttestor},
};

const WAIT: Duration = Duration::from_secs(10);
const CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
const CREATOR: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

#[tokio::test]
async fn test_reconnect_resubscribes_every_address() {
	let addresses = vec![
		"ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM.dlc-manager-v1".to_string(),
		"ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM.dlc-manager-v2".to_string(),
	];
	let (url, mut requests) = feed_server::start(
		addresses.len(),
		vec![
			Session {
				frames: Vec::new(),
				close_after: true,
			},
			Session {
				frames: Vec::new(),
				close_after: false,
			},
		],
	)
	.await;

	let (sink, notifications) = mpsc::channel(4);
	let supervisor = ReconnectSupervisor::new(
		url,
		StacksAddressFeed::new(addresses.clone()),
		feed_server::fast_config(),
		sink,
	);
	let task = tokio::spawn(supervisor.clone().run());

	let mut subscribed = vec![Vec::new(), Vec::new()];
	for _ in 0..4 {
		let (connection, request) = timeout(WAIT, requests.recv()).await.unwrap().unwrap();
		assert_eq!(request["method"], "subscribe");
		subscribed[connection].push(request["params"]["address"].as_str().unwrap().to_string());
	}
	assert_eq!(subscribed[0], addresses);
	assert_eq!(subscribed[1], addresses);

	timeout(WAIT, async {
		while !(supervisor.sessions() == 2 && supervisor.state() == SubscriptionState::Subscribed) {
			tokio::time::sleep(Duration::from_millis(20)).await;
		}
	})
	.await
	.unwrap();

	drop(notifications);
	timeout(WAIT, task).await.unwrap().unwrap();
}

fn evm_endpoint(url: &str) -> ChainEndpoint {
	ChainEndpoint {
		slug: "eth_localhost_v1".to_string(),
		chain: ChainTag::Evm(EvmNetwork::Localhost),
		version: "1".to_string(),
		contract_address: format!("{:#x}", CONTRACT),
		contract_name: "DLCManager".to_string(),
		endpoint: url.to_string(),
		write_endpoint: None,
		api_key: None,
		signing_key: None,
		wallet_address: None,
		precision_shift: 2,
		maturation_offset: None,
		stacks_fee: DEFAULT_STACKS_FEE,
		gas_margin: DEFAULT_GAS_MARGIN,
		observe: true,
		broadcast: false,
	}
}

#[tokio::test]
async fn test_evm_close_log_reaches_attestor() {
	let close = DLCManager::CloseDLC {
		uuid: FixedBytes::from([0x11; 32]),
		outcome: U256::from(10_050u64),
		creator: CREATOR,
		protocolWallet: CREATOR,
		sender: CREATOR,
		eventSource: "dlclink:close-dlc:v1".to_string(),
	};
	let log = EVMLog {
		inner: alloy::primitives::Log {
			address: CONTRACT,
			data: close.encode_log_data(),
		},
		transaction_hash: Some(FixedBytes::from([0xaa; 32])),
		..Default::default()
	};
	let frame = json!({
		"jsonrpc": "2.0",
		"method": "eth_subscription",
		"params": { "subscription": "0x1", "result": serde_json::to_value(&log).unwrap() }
	});

	let (url, mut requests) = feed_server::start(
		1,
		vec![Session {
			frames: vec![
				json!({ "jsonrpc": "2.0", "id": 1, "result": "0x1" }).to_string(),
				frame.to_string(),
			],
			close_after: false,
		}],
	)
	.await;

	let (attested_tx, mut attested_rx) = mpsc::unbounded_channel();
	let mut attestor = MockAttestor::new();
	attestor
		.expect_create_attestation()
		.times(1)
		.returning(move |id, outcome| {
			let _ = attested_tx.send((id.clone(), outcome));
			Ok(Attestation {
				uuid: id.clone(),
				outcome,
			})
		});
	allow_event_readback(&mut attestor);

	let dispatcher = Arc::new(AttestationDispatcher::new(
		Arc::new(attestor),
		Duration::from_secs(60),
	));
	let observer = Arc::new(EvmObserver::new(&evm_endpoint(&url), dispatcher).unwrap());

	let (sink, notifications) = mpsc::channel(4);
	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let supervisor =
		ReconnectSupervisor::new(url, observer.feed(), feed_server::fast_config(), sink);
	let supervisor_task = tokio::spawn(supervisor.run());
	let consumer = tokio::spawn(consume(observer, notifications, shutdown_rx));

	let (_, subscription) = timeout(WAIT, requests.recv()).await.unwrap().unwrap();
	assert_eq!(subscription["method"], "eth_subscribe");
	assert_eq!(subscription["params"][0], "logs");
	assert_eq!(subscription["params"][1]["address"], format!("{:#x}", CONTRACT));

	let (contract_id, outcome) = timeout(WAIT, attested_rx.recv()).await.unwrap().unwrap();
	assert_eq!(contract_id, ContractId::from_bytes(&[0x11; 32]));
	assert_eq!(outcome, 101);

	shutdown_tx.send(true).unwrap();
	assert_eq!(timeout(WAIT, consumer).await.unwrap().unwrap(), 1);
	timeout(WAIT, supervisor_task).await.unwrap().unwrap();
}
