//! Stacks observation and broadcasting against local node and socket
//! servers.

use std::{sync::Arc, time::Duration};

use dlc_observer::{
	models::{
		ChainEndpoint, ChainTag, ClarityValue, ContractId, ReceiptStatus, SigningKey,
		StacksNetwork, DEFAULT_GAS_MARGIN, DEFAULT_STACKS_FEE,
	},
	services::{
		attestation::{AttestationDispatcher, Attestation},
		blockchain::{ReconnectSupervisor, StacksAddressFeed, StacksClient},
		broadcaster::{StacksWrappedContract, WrappedContract},
		nonce::NonceCoordinator,
		observer::{consume, StacksObserver},
	},
	utils::{create_http_client, HttpRetryConfig},
};
use mockito::Matcher;
use serde_json::json;
use tokio::{
	sync::{mpsc, watch},
	time::timeout,
};

use crate::integration::{
	feed_server::{self, Session},
	mocks::{allow_event_readback, MockAttestor},
};

const CHAIN: ChainTag = ChainTag::Stacks(StacksNetwork::Testnet);
const DEPLOYER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
const WALLET: &str = "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG";
const KEY: &str = "7287ba251d44a4d3fd9276c88ce34c5c52a038955511cccaf77e61068649c17801";
const WAIT: Duration = Duration::from_secs(10);

fn endpoint(url: &str) -> ChainEndpoint {
	ChainEndpoint {
		slug: "stx_testnet_v1".to_string(),
		chain: CHAIN,
		version: "1".to_string(),
		contract_address: DEPLOYER.to_string(),
		contract_name: "dlc-manager-v1".to_string(),
		endpoint: url.to_string(),
		write_endpoint: None,
		api_key: None,
		signing_key: Some(SigningKey::new(KEY)),
		wallet_address: Some(WALLET.to_string()),
		precision_shift: 0,
		maturation_offset: None,
		stacks_fee: DEFAULT_STACKS_FEE,
		gas_margin: DEFAULT_GAS_MARGIN,
		observe: true,
		broadcast: true,
	}
}

fn client(url: &str) -> Arc<StacksClient> {
	let http = create_http_client(Duration::from_secs(5), &HttpRetryConfig::default()).unwrap();
	Arc::new(StacksClient::new(http, url))
}

fn close_dlc_print() -> String {
	let tuple = ClarityValue::Tuple(
		[
			("uuid", ClarityValue::Buffer(vec![0x07; 32])),
			("outcome", ClarityValue::UInt(37)),
			("creator", ClarityValue::principal(WALLET).unwrap()),
			(
				"event-source",
				ClarityValue::StringAscii("dlclink:close-dlc:v1".to_string()),
			),
		]
		.into_iter()
		.map(|(k, v)| (k.to_string(), v))
		.collect(),
	);
	tuple.to_hex()
}

#[tokio::test]
async fn test_close_dlc_print_event_reaches_attestor() {
	let mut node = mockito::Server::new_async().await;
	let endpoint = endpoint(&node.url());
	let contract = endpoint.contract_identifier();

	let detail = json!({
		"tx_id": "0xbeef",
		"tx_status": "success",
		"is_unanchored": false,
		"event_count": 2,
		"block_height": 5,
		"events": [
			{ "event_type": "stx_transfer_event", "event_index": 0 },
			{
				"event_type": "smart_contract_log",
				"event_index": 1,
				"contract_log": {
					"contract_id": contract,
					"topic": "print",
					"value": { "hex": close_dlc_print() }
				}
			}
		]
	});
	let tx_mock = node
		.mock("GET", "/extended/v1/tx/0xbeef")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(detail.to_string())
		.expect(1)
		.create_async()
		.await;

	let update = json!({
		"jsonrpc": "2.0",
		"method": "address_tx_update",
		"params": {
			"address": contract,
			"tx_id": "0xbeef",
			"tx_type": "contract_call",
			"tx_status": "success",
			"tx": {
				"tx_id": "0xbeef",
				"nonce": 7,
				"fee_rate": "2000",
				"sender_address": "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG",
				"tx_status": "success",
				"tx_type": "contract_call",
				"block_height": 1200,
				"is_unanchored": false,
				"event_count": 2,
				"contract_call": {
					"contract_id": contract,
					"function_name": "close-dlc"
				}
			}
		}
	});
	let pending = json!({
		"jsonrpc": "2.0",
		"method": "address_tx_update",
		"params": {
			"address": contract,
			"tx_id": "0xcafe",
			"tx_type": "contract_call",
			"tx_status": "pending"
		}
	});
	let (ws_url, mut requests) = feed_server::start(
		1,
		vec![Session {
			frames: vec![
				json!({ "jsonrpc": "2.0", "id": 1, "result": {} }).to_string(),
				pending.to_string(),
				update.to_string(),
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
	let observer = Arc::new(StacksObserver::new(&endpoint, client(&node.url()), dispatcher));

	let (sink, notifications) = mpsc::channel(16);
	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let supervisor = ReconnectSupervisor::new(
		ws_url,
		StacksAddressFeed::new(vec![contract.clone()]),
		feed_server::fast_config(),
		sink,
	);
	let supervisor_task = tokio::spawn(supervisor.run());
	let consumer = tokio::spawn(consume(observer, notifications, shutdown_rx));

	let (_, subscription) = timeout(WAIT, requests.recv()).await.unwrap().unwrap();
	assert_eq!(subscription["method"], "subscribe");
	assert_eq!(subscription["params"]["event"], "address_tx_update");
	assert_eq!(subscription["params"]["address"], contract);

	let (contract_id, outcome) = timeout(WAIT, attested_rx.recv()).await.unwrap().unwrap();
	assert_eq!(contract_id, ContractId::from_bytes(&[0x07; 32]));
	assert_eq!(outcome, 37);

	shutdown_tx.send(true).unwrap();
	assert_eq!(timeout(WAIT, consumer).await.unwrap().unwrap(), 2);
	timeout(WAIT, supervisor_task).await.unwrap().unwrap();
	tx_mock.assert_async().await;
}

async fn mock_callback(node: &mut mockito::Server) -> mockito::Mock {
	let callback = ClarityValue::principal(&format!("{}.dlc-callback", DEPLOYER)).unwrap();
	node.mock(
		"POST",
		Matcher::Regex(format!(
			"^/v2/contracts/call-read/{}/dlc-manager-v1/get-callback-contract",
			DEPLOYER
		)),
	)
	.with_status(200)
	.with_header("content-type", "application/json")
	.with_body(
		json!({
			"okay": true,
			"result": ClarityValue::ResponseOk(Box::new(callback)).to_hex()
		})
		.to_string(),
	)
	.create_async()
	.await
}

async fn mock_account(node: &mut mockito::Server, nonce: u64) -> mockito::Mock {
	node.mock("GET", Matcher::Regex(format!("^/v2/accounts/{}", WALLET)))
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(json!({ "nonce": nonce, "balance": "0x0" }).to_string())
		.create_async()
		.await
}

#[tokio::test]
async fn test_stacks_writes_are_sequenced_past_the_node_nonce() {
	let mut node = mockito::Server::new_async().await;
	let _callback = mock_callback(&mut node).await;
	let _account = mock_account(&mut node, 4).await;
	let broadcast = node
		.mock("POST", "/v2/transactions")
		.match_header("content-type", "application/octet-stream")
		.with_status(200)
		.with_body("\"0xfeed\"")
		.expect(2)
		.create_async()
		.await;

	let client = client(&node.url());
	let nonces = Arc::new(NonceCoordinator::new().with_source(CHAIN, client.clone()));
	let contract = StacksWrappedContract::new(&endpoint(&node.url()), client, nonces.clone()).unwrap();
	let contract_id = ContractId::from_bytes(&[0x07; 32]);

	let funded = contract.set_status_funded(&contract_id, "btc-funding").await.unwrap();
	assert_eq!(funded.status, ReceiptStatus::Submitted);
	assert_eq!(funded.tx_id, "0xfeed");
	assert_eq!(funded.nonce, Some(4));

	// the node still reports 4 while the first transaction sits in the mempool
	let closed = contract.post_close_dlc(&contract_id, "btc-closing").await.unwrap();
	assert_eq!(closed.nonce, Some(5));
	assert_eq!(nonces.cached(contract.identity()).await, Some(5));

	broadcast.assert_async().await;
}

#[tokio::test]
async fn test_rejected_broadcast_releases_the_nonce() {
	let mut node = mockito::Server::new_async().await;
	let _callback = mock_callback(&mut node).await;
	let _account = mock_account(&mut node, 9).await;
	let _broadcast = node
		.mock("POST", "/v2/transactions")
		.with_status(400)
		.with_header("content-type", "application/json")
		.with_body(json!({ "error": "transaction rejected", "reason": "NotEnoughFunds" }).to_string())
		.create_async()
		.await;

	let client = client(&node.url());
	let nonces = Arc::new(NonceCoordinator::new().with_source(CHAIN, client.clone()));
	let contract = StacksWrappedContract::new(&endpoint(&node.url()), client, nonces.clone()).unwrap();

	let result = contract
		.set_status_funded(&ContractId::from_bytes(&[0x07; 32]), "btc-funding")
		.await;
	let error = result.unwrap_err();
	assert!(error.to_string().contains("NotEnoughFunds"));
	assert_eq!(nonces.cached(contract.identity()).await, None);
}
