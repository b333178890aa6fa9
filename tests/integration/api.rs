//! Administrative routes over scripted broadcasters and attestor.

use std::{net::SocketAddr, sync::Arc};

use actix_web::{http::StatusCode, test, web, App};
use dlc_observer::{
	models::{ChainTag, ContractId, EvmNetwork, Receipt, ReceiptStatus, StacksNetwork},
	services::{
		api::{configure_routes, ApiState},
		attestation::AttestationError,
		broadcaster::{BroadcastError, ContractPool},
	},
};
use serde_json::{json, Value};

use crate::integration::mocks::{MockAttestor, MockContract};

const SEPOLIA: ChainTag = ChainTag::Evm(EvmNetwork::Sepolia);
const STACKS: ChainTag = ChainTag::Stacks(StacksNetwork::Testnet);

fn receipt(chain: ChainTag, contract_id: &ContractId, nonce: u64) -> Receipt {
	Receipt {
		chain,
		contract_id: contract_id.clone(),
		tx_id: format!("0x{:02x}", nonce),
		status: ReceiptStatus::Submitted,
		nonce: Some(nonce),
		block_number: None,
		gas_used: None,
	}
}

fn local_peer() -> SocketAddr {
	"127.0.0.1:41000".parse().unwrap()
}

fn contract(chain: ChainTag) -> MockContract {
	let mut contract = MockContract::new();
	contract.expect_chain().return_const(chain);
	contract
}

#[actix_web::test]
async fn test_writes_are_routed_by_chain_tag() {
	let mut sepolia = contract(SEPOLIA);
	sepolia
		.expect_set_status_funded()
		.withf(|id, btc| *id == ContractId::new("0xab") && btc == "btc-funding")
		.times(1)
		.returning(|id, _| Ok(receipt(SEPOLIA, id, 1)));

	let mut stacks = contract(STACKS);
	stacks
		.expect_post_close_dlc()
		.withf(|id, btc| *id == ContractId::new("0xcd") && btc == "btc-closing")
		.times(1)
		.returning(|id, _| Ok(receipt(STACKS, id, 7)));

	let mut contracts = ContractPool::new();
	contracts.insert(Arc::new(sepolia));
	contracts.insert(Arc::new(stacks));
	let app = test::init_service(
		App::new()
			.app_data(web::Data::new(ApiState::new(contracts)))
			.configure(configure_routes),
	)
	.await;

	let req = test::TestRequest::post()
		.uri("/set-status-funded")
		.peer_addr(local_peer())
		.set_json(json!({ "uuid": "0xAB", "btcTxId": "btc-funding", "chain": "evm-sepolia" }))
		.to_request();
	let body: Value = test::call_and_read_body_json(&app, req).await;
	assert_eq!(body["chain"], "evm-sepolia");
	assert_eq!(body["nonce"], 1);

	let req = test::TestRequest::post()
		.uri("/post-close-dlc")
		.peer_addr(local_peer())
		.set_json(json!({ "uuid": "0xcd", "btcTxId": "btc-closing", "chain": "stx-testnet" }))
		.to_request();
	let body: Value = test::call_and_read_body_json(&app, req).await;
	assert_eq!(body["chain"], "stx-testnet");
	assert_eq!(body["status"], "submitted");
}

#[actix_web::test]
async fn test_chain_failure_is_a_server_error() {
	let mut sepolia = contract(SEPOLIA);
	sepolia
		.expect_post_close_dlc()
		.times(1)
		.returning(|_, _| Err(BroadcastError::chain_error("execution reverted")));

	let mut contracts = ContractPool::new();
	contracts.insert(Arc::new(sepolia));
	let app = test::init_service(
		App::new()
			.app_data(web::Data::new(ApiState::new(contracts)))
			.configure(configure_routes),
	)
	.await;

	let req = test::TestRequest::post()
		.uri("/post-close-dlc")
		.peer_addr(local_peer())
		.set_json(json!({ "uuid": "0x01", "btcTxId": "b", "chain": "evm-sepolia" }))
		.to_request();
	let resp = test::call_service(&app, req).await;
	assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
	let body: Value = test::read_body_json(resp).await;
	assert!(body["error"].as_str().unwrap().contains("execution reverted"));
}

#[actix_web::test]
async fn test_attestor_passthrough() {
	let mut attestor = MockAttestor::new();
	attestor
		.expect_get_event()
		.withf(|id| *id == ContractId::new("0x01"))
		.returning(|_| Ok(Some(json!({ "uuid": "0x01", "outcome": null }))));
	attestor
		.expect_get_all_events()
		.returning(|| Err(AttestationError::request_error("connection refused")));

	let state = ApiState::new(ContractPool::new()).with_attestor(Arc::new(attestor));
	let app = test::init_service(
		App::new()
			.app_data(web::Data::new(state))
			.configure(configure_routes),
	)
	.await;

	let req = test::TestRequest::get().uri("/event/0x01").to_request();
	let body: Value = test::call_and_read_body_json(&app, req).await;
	assert_eq!(body["uuid"], "0x01");

	let req = test::TestRequest::get().uri("/events").to_request();
	assert_eq!(
		test::call_service(&app, req).await.status(),
		StatusCode::BAD_GATEWAY
	);
}
