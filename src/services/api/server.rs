//! Route handlers and server construction.

use actix_web::{
	middleware::{Compress, DefaultHeaders, NormalizePath},
	web, App, HttpRequest, HttpResponse, HttpServer,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
	models::{ChainTag, ContractId},
	services::{
		api::{is_local_or_docker, ApiState},
		attestation::AttestationService,
		broadcaster::{BroadcastError, WrappedContract},
	},
};

/// Body of the two write routes
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
	pub uuid: Option<String>,
	pub btc_tx_id: Option<String>,
	pub chain: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum WriteCall {
	SetStatusFunded,
	PostCloseDlc,
}

impl WriteCall {
	fn route(&self) -> &'static str {
		match self {
			Self::SetStatusFunded => "set-status-funded",
			Self::PostCloseDlc => "post-close-dlc",
		}
	}
}

fn present(value: &Option<String>) -> Option<&str> {
	value.as_deref().filter(|v| !v.trim().is_empty())
}

fn forbidden(req: &HttpRequest) -> Option<HttpResponse> {
	let peer = req.peer_addr().map(|addr| addr.ip());
	if is_local_or_docker(peer) {
		return None;
	}
	warn!(peer = ?peer, path = req.path(), "rejected non-local caller");
	Some(HttpResponse::Forbidden().body("Forbidden"))
}

fn broadcast_failure(e: BroadcastError) -> HttpResponse {
	let body = json!({ "error": e.to_string() });
	if e.is_client_error() {
		HttpResponse::BadRequest().json(body)
	} else {
		HttpResponse::InternalServerError().json(body)
	}
}

async fn write(call: WriteCall, req: &HttpRequest, state: &ApiState, body: WriteRequest) -> HttpResponse {
	if let Some(response) = forbidden(req) {
		return response;
	}

	let Some(uuid) = present(&body.uuid) else {
		return HttpResponse::BadRequest().body("Missing UUID");
	};
	let Some(btc_tx_id) = present(&body.btc_tx_id) else {
		return HttpResponse::BadRequest().body("Missing BTC TX ID");
	};
	let Some(chain) = present(&body.chain) else {
		return HttpResponse::BadRequest().body("Missing chain");
	};

	info!(uuid, btc_tx_id, chain, route = call.route(), "write requested");
	if state.test_mode {
		return HttpResponse::Ok().body(format!("{} called in test mode.", call.route()));
	}

	let chain: ChainTag = match chain.parse() {
		Ok(chain) => chain,
		Err(e) => return HttpResponse::BadRequest().body(format!("Invalid chain: {}", e)),
	};
	let Some(contract) = state.contracts.get(&chain) else {
		return HttpResponse::NotFound().body(format!("No contract configured for {}", chain));
	};

	let contract_id = ContractId::new(uuid);
	let result = match call {
		WriteCall::SetStatusFunded => contract.set_status_funded(&contract_id, btc_tx_id).await,
		WriteCall::PostCloseDlc => contract.post_close_dlc(&contract_id, btc_tx_id).await,
	};
	match result {
		Ok(receipt) => HttpResponse::Ok().json(receipt),
		Err(e) => broadcast_failure(e),
	}
}

async fn set_status_funded(
	req: HttpRequest,
	state: web::Data<ApiState>,
	body: web::Json<WriteRequest>,
) -> HttpResponse {
	write(WriteCall::SetStatusFunded, &req, &state, body.into_inner()).await
}

async fn post_close_dlc(
	req: HttpRequest,
	state: web::Data<ApiState>,
	body: web::Json<WriteRequest>,
) -> HttpResponse {
	write(WriteCall::PostCloseDlc, &req, &state, body.into_inner()).await
}

async fn get_all_attestors(req: HttpRequest, state: web::Data<ApiState>) -> HttpResponse {
	if let Some(response) = forbidden(&req) {
		return response;
	}
	HttpResponse::Ok().json(&state.attestor_list)
}

async fn health(state: web::Data<ApiState>) -> HttpResponse {
	let writers: Vec<String> = state.contracts.chains().iter().map(|c| c.to_string()).collect();
	HttpResponse::Ok().json(json!({
		"status": "ok",
		"test_mode": state.test_mode,
		"writers": writers,
		"observed": state.observed,
	}))
}

async fn contract_info(
	state: web::Data<ApiState>,
	path: web::Path<(String, String)>,
) -> HttpResponse {
	let (chain, uuid) = path.into_inner();
	let chain: ChainTag = match chain.parse() {
		Ok(chain) => chain,
		Err(e) => return HttpResponse::BadRequest().body(format!("Invalid chain: {}", e)),
	};
	let Some(contract) = state.contracts.get(&chain) else {
		return HttpResponse::NotFound().body(format!("No contract configured for {}", chain));
	};
	match contract.get_contract_info(&ContractId::new(uuid)).await {
		Ok(info) => HttpResponse::Ok().json(info),
		Err(e) => broadcast_failure(e),
	}
}

fn attestor(state: &ApiState) -> Result<&dyn AttestationService, HttpResponse> {
	state
		.attestor
		.as_deref()
		.ok_or_else(|| HttpResponse::ServiceUnavailable().body("No attestor configured"))
}

fn attestor_failure(e: impl std::fmt::Display) -> HttpResponse {
	error!(error = %e, "attestor request failed");
	HttpResponse::BadGateway().json(json!({ "error": e.to_string() }))
}

async fn get_event(state: web::Data<ApiState>, path: web::Path<String>) -> HttpResponse {
	let attestor = match attestor(&state) {
		Ok(attestor) => attestor,
		Err(response) => return response,
	};
	match attestor.get_event(&ContractId::new(path.into_inner())).await {
		Ok(Some(event)) => HttpResponse::Ok().json(event),
		Ok(None) => HttpResponse::NotFound().body("Event not found"),
		Err(e) => attestor_failure(e),
	}
}

async fn get_events(state: web::Data<ApiState>) -> HttpResponse {
	let attestor = match attestor(&state) {
		Ok(attestor) => attestor,
		Err(response) => return response,
	};
	match attestor.get_all_events().await {
		Ok(events) => HttpResponse::Ok().json(events),
		Err(e) => attestor_failure(e),
	}
}

async fn get_public_key(state: web::Data<ApiState>) -> HttpResponse {
	let attestor = match attestor(&state) {
		Ok(attestor) => attestor,
		Err(response) => return response,
	};
	match attestor.get_public_key().await {
		Ok(key) => HttpResponse::Ok().content_type("text/plain").body(key),
		Err(e) => attestor_failure(e),
	}
}

/// Registers every route on `cfg`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("/set-status-funded", web::post().to(set_status_funded))
		.route("/post-close-dlc", web::post().to(post_close_dlc))
		.route("/get-all-attestors", web::get().to(get_all_attestors))
		.route("/health", web::get().to(health))
		.route("/contract-info/{chain}/{uuid}", web::get().to(contract_info))
		.route("/event/{uuid}", web::get().to(get_event))
		.route("/events", web::get().to(get_events))
		.route("/publickey", web::get().to(get_public_key));
}

/// Inside a container the server listens on every interface.
fn resolve_bind_address(bind_address: &str, in_docker: bool) -> String {
	if !in_docker {
		return bind_address.to_string();
	}
	match bind_address.rsplit_once(':') {
		Some((_, port)) => format!("0.0.0.0:{}", port),
		None => "0.0.0.0:3000".to_string(),
	}
}

/// Binds the administrative server.
pub fn create_api_server(
	bind_address: &str,
	state: ApiState,
) -> std::io::Result<actix_web::dev::Server> {
	let in_docker = std::env::var("IN_DOCKER").unwrap_or_default() == "true";
	let actual_bind_address = resolve_bind_address(bind_address, in_docker);

	info!(
		"Starting API server on {} (actual bind: {})",
		bind_address, actual_bind_address
	);

	let state = web::Data::new(state);
	Ok(HttpServer::new(move || {
		App::new()
			.wrap(Compress::default())
			.wrap(NormalizePath::trim())
			.wrap(DefaultHeaders::new())
			.app_data(state.clone())
			.configure(configure_routes)
	})
	.workers(2)
	.bind(actual_bind_address)?
	.disable_signals()
	.shutdown_timeout(5)
	.run())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		models::{ContractInfo, EvmNetwork, Receipt, ReceiptStatus},
		services::{attestation::test_support::Recorder, broadcaster::ContractPool},
	};
	use actix_web::{http::StatusCode, test};
	use async_trait::async_trait;
	use std::{
		net::SocketAddr,
		sync::{Arc, Mutex},
	};

	const CHAIN: ChainTag = ChainTag::Evm(EvmNetwork::Localhost);

	#[derive(Default)]
	struct FakeContract {
		calls: Mutex<Vec<(String, ContractId, String)>>,
	}

	#[async_trait]
	impl WrappedContract for FakeContract {
		fn chain(&self) -> ChainTag {
			CHAIN
		}

		async fn set_status_funded(
			&self,
			contract_id: &ContractId,
			btc_tx_id: &str,
		) -> Result<Receipt, BroadcastError> {
			self.calls.lock().unwrap().push((
				"funded".to_string(),
				contract_id.clone(),
				btc_tx_id.to_string(),
			));
			Ok(Receipt {
				chain: CHAIN,
				contract_id: contract_id.clone(),
				tx_id: "0x01".to_string(),
				status: ReceiptStatus::Confirmed,
				nonce: Some(3),
				block_number: Some(9),
				gas_used: Some(21_000),
			})
		}

		async fn post_close_dlc(
			&self,
			contract_id: &ContractId,
			_btc_tx_id: &str,
		) -> Result<Receipt, BroadcastError> {
			Err(BroadcastError::invalid_input(format!("{} is not a 32 byte hex id", contract_id)))
		}

		async fn get_contract_info(
			&self,
			contract_id: &ContractId,
		) -> Result<ContractInfo, BroadcastError> {
			Ok(ContractInfo {
				chain: CHAIN,
				contract_id: contract_id.clone(),
				details: json!({ "status": 2 }),
			})
		}
	}

	fn state(contract: Arc<FakeContract>) -> ApiState {
		let mut contracts = ContractPool::new();
		contracts.insert(contract);
		ApiState::new(contracts)
			.with_attestor(Arc::new(Recorder::default()))
			.with_attestor_list(vec!["https://attestor-1.dlc.link".to_string()])
			.with_observed(vec!["eth_local".to_string()])
	}

	fn local_peer() -> SocketAddr {
		"127.0.0.1:41000".parse().unwrap()
	}

	macro_rules! app {
		($state:expr) => {
			test::init_service(
				App::new()
					.app_data(web::Data::new($state))
					.configure(configure_routes),
			)
			.await
		};
	}

	#[actix_web::test]
	async fn test_set_status_funded_returns_receipt() {
		let contract = Arc::new(FakeContract::default());
		let app = app!(state(contract.clone()));

		let req = test::TestRequest::post()
			.uri("/set-status-funded")
			.peer_addr(local_peer())
			.set_json(json!({ "uuid": "0xAB", "btcTxId": "btc1", "chain": "evm-localhost" }))
			.to_request();
		let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

		assert_eq!(body["tx_id"], "0x01");
		assert_eq!(body["status"], "confirmed");
		assert_eq!(body["chain"], "evm-localhost");
		let calls = contract.calls.lock().unwrap();
		assert_eq!(calls[0].1, ContractId::new("0xab"));
		assert_eq!(calls[0].2, "btc1");
	}

	#[actix_web::test]
	async fn test_missing_fields_and_bad_chain() {
		let app = app!(state(Arc::new(FakeContract::default())));

		for (body, expected) in [
			(json!({ "btcTxId": "b", "chain": "evm-localhost" }), "Missing UUID"),
			(json!({ "uuid": "0x01", "chain": "evm-localhost" }), "Missing BTC TX ID"),
			(json!({ "uuid": "0x01", "btcTxId": "b" }), "Missing chain"),
		] {
			let req = test::TestRequest::post()
				.uri("/post-close-dlc")
				.peer_addr(local_peer())
				.set_json(body)
				.to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
			assert_eq!(test::read_body(resp).await, expected.as_bytes());
		}

		let req = test::TestRequest::post()
			.uri("/set-status-funded")
			.peer_addr(local_peer())
			.set_json(json!({ "uuid": "0x01", "btcTxId": "b", "chain": "sol-mainnet" }))
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::post()
			.uri("/set-status-funded")
			.peer_addr(local_peer())
			.set_json(json!({ "uuid": "0x01", "btcTxId": "b", "chain": "stx-mainnet" }))
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
	}

	#[actix_web::test]
	async fn test_broadcast_client_error_is_bad_request() {
		let app = app!(state(Arc::new(FakeContract::default())));
		let req = test::TestRequest::post()
			.uri("/post-close-dlc")
			.peer_addr(local_peer())
			.set_json(json!({ "uuid": "0x01", "btcTxId": "b", "chain": "evm-localhost" }))
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn test_test_mode_short_circuits() {
		let contract = Arc::new(FakeContract::default());
		let app = app!(state(contract.clone()).with_test_mode(true));

		let req = test::TestRequest::post()
			.uri("/post-close-dlc")
			.peer_addr(local_peer())
			.set_json(json!({ "uuid": "0x01", "btcTxId": "b", "chain": "evm-localhost" }))
			.to_request();
		let body = test::call_and_read_body(&app, req).await;
		assert_eq!(body, "post-close-dlc called in test mode.".as_bytes());
		assert!(contract.calls.lock().unwrap().is_empty());
	}

	#[actix_web::test]
	async fn test_remote_caller_is_forbidden() {
		let app = app!(state(Arc::new(FakeContract::default())));
		let req = test::TestRequest::get()
			.uri("/get-all-attestors")
			.insert_header(("host", "observer.example.com"))
			.peer_addr("10.1.2.3:5555".parse().unwrap())
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

		let req = test::TestRequest::get()
			.uri("/get-all-attestors")
			.insert_header(("host", "observer.example.com"))
			.peer_addr("172.17.0.2:5555".parse().unwrap())
			.to_request();
		let body: Vec<String> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body, vec!["https://attestor-1.dlc.link".to_string()]);
	}

	#[actix_web::test]
	async fn test_forwarding_headers_do_not_grant_access() {
		let contract = Arc::new(FakeContract::default());
		let app = app!(state(contract.clone()));
		let remote: SocketAddr = "8.8.8.8:5555".parse().unwrap();

		let req = test::TestRequest::get()
			.uri("/get-all-attestors")
			.insert_header(("x-forwarded-host", "localhost"))
			.insert_header(("forwarded", "host=localhost;for=127.0.0.1"))
			.insert_header(("host", "localhost:3000"))
			.peer_addr(remote)
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

		let req = test::TestRequest::post()
			.uri("/set-status-funded")
			.insert_header(("x-forwarded-host", "localhost"))
			.peer_addr(remote)
			.set_json(json!({ "uuid": "0x01", "btcTxId": "b", "chain": "evm-localhost" }))
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
		assert!(contract.calls.lock().unwrap().is_empty());

		let req = test::TestRequest::get().uri("/get-all-attestors").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
	}

	#[actix_web::test]
	async fn test_reads() {
		let app = app!(state(Arc::new(FakeContract::default())));

		let req = test::TestRequest::get().uri("/health").to_request();
		let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["writers"], json!(["evm-localhost"]));
		assert_eq!(body["observed"], json!(["eth_local"]));

		let req = test::TestRequest::get()
			.uri("/contract-info/evm-localhost/0x01")
			.to_request();
		let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["details"]["status"], 2);

		let req = test::TestRequest::get().uri("/publickey").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "pk".as_bytes());

		let req = test::TestRequest::get().uri("/event/0x01").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

		let req = test::TestRequest::get().uri("/events").to_request();
		let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body, json!([]));
	}

	#[actix_web::test]
	async fn test_reads_without_attestor() {
		let app = app!(ApiState::new(ContractPool::new()));
		let req = test::TestRequest::get().uri("/events").to_request();
		assert_eq!(
			test::call_service(&app, req).await.status(),
			StatusCode::SERVICE_UNAVAILABLE
		);
	}

	#[::core::prelude::v1::test]
	fn test_docker_bind_address() {
		assert_eq!(resolve_bind_address("127.0.0.1:3000", false), "127.0.0.1:3000");
		assert_eq!(resolve_bind_address("localhost:8081", true), "0.0.0.0:8081");
		assert_eq!(resolve_bind_address("localhost", true), "0.0.0.0:3000");
	}
}
