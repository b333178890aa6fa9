//! Stacks API client.
//!
//! REST access to a Stacks node and its extended API: transaction details for
//! the observer, account nonces, read-only calls and transaction broadcast for
//! the broadcaster.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;

use crate::{
	models::{
		blockchain::stacks::{AccountInfo, BroadcastRejection, ReadOnlyResponse},
		ClarityValue, TransactionDetail,
	},
	services::{
		blockchain::BlockChainError,
		nonce::{NonceError, NonceSource, SigningIdentity},
	},
};

/// How long to keep asking for a transaction the API has not indexed yet
#[derive(Debug, Clone)]
pub struct IndexingRetry {
	pub min_delay: Duration,
	pub max_delay: Duration,
	pub max_times: usize,
}

impl Default for IndexingRetry {
	fn default() -> Self {
		Self {
			min_delay: Duration::from_millis(500),
			max_delay: Duration::from_secs(4),
			max_times: 4,
		}
	}
}

/// Stacks node operations used by observers and broadcasters
#[async_trait]
pub trait StacksClientTrait: Send + Sync {
	/// `GET /extended/v1/tx/{tx_id}`
	async fn get_transaction(&self, tx_id: &str) -> Result<TransactionDetail, BlockChainError>;

	/// Next nonce the node expects from `address`
	async fn get_account_nonce(&self, address: &str) -> Result<u64, BlockChainError>;

	/// Evaluates a read-only function and returns its Clarity result
	async fn call_read_only(
		&self,
		contract_address: &str,
		contract_name: &str,
		function_name: &str,
		sender: &str,
		args: &[ClarityValue],
	) -> Result<ClarityValue, BlockChainError>;

	/// Broadcasts a serialized transaction and returns its id
	async fn broadcast_transaction(&self, payload: Vec<u8>) -> Result<String, BlockChainError>;
}

#[derive(Clone)]
pub struct StacksClient {
	http: ClientWithMiddleware,
	base_url: String,
	indexing_retry: IndexingRetry,
}

fn with_hex_prefix(tx_id: &str) -> String {
	if tx_id.starts_with("0x") {
		tx_id.to_string()
	} else {
		format!("0x{}", tx_id)
	}
}

impl StacksClient {
	/// Creates a client for the API at `base_url` (`http(s)://host[:port]`).
	pub fn new(http: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
		Self {
			http,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			indexing_retry: IndexingRetry::default(),
		}
	}

	pub fn with_indexing_retry(mut self, indexing_retry: IndexingRetry) -> Self {
		self.indexing_retry = indexing_retry;
		self
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	async fn fetch_transaction(&self, tx_id: &str) -> Result<TransactionDetail, BlockChainError> {
		let url = format!(
			"{}/extended/v1/tx/{}",
			self.base_url,
			urlencoding::encode(tx_id)
		);
		let response = self.http.get(&url).send().await?;

		match response.status() {
			StatusCode::NOT_FOUND => Err(BlockChainError::transaction_not_found(tx_id)),
			status if status.is_success() => Ok(response.json::<TransactionDetail>().await?),
			status => Err(BlockChainError::request_error(format!(
				"GET {} returned {}",
				url, status
			))),
		}
	}
}

#[async_trait]
impl StacksClientTrait for StacksClient {
	async fn get_transaction(&self, tx_id: &str) -> Result<TransactionDetail, BlockChainError> {
		let tx_id = with_hex_prefix(tx_id);
		let backoff = ExponentialBuilder::default()
			.with_min_delay(self.indexing_retry.min_delay)
			.with_max_delay(self.indexing_retry.max_delay)
			.with_max_times(self.indexing_retry.max_times);

		(|| async { self.fetch_transaction(&tx_id).await })
			.retry(backoff)
			.when(|e: &BlockChainError| e.is_not_found())
			.notify(|_, delay: Duration| {
				tracing::debug!(tx_id = %tx_id, ?delay, "transaction not indexed yet");
			})
			.await
	}

	async fn get_account_nonce(&self, address: &str) -> Result<u64, BlockChainError> {
		let url = format!(
			"{}/v2/accounts/{}?proof=0",
			self.base_url,
			urlencoding::encode(address)
		);
		let response = self.http.get(&url).send().await?;
		if !response.status().is_success() {
			return Err(BlockChainError::request_error(format!(
				"GET {} returned {}",
				url,
				response.status()
			)));
		}
		let account: AccountInfo = response.json().await?;
		Ok(account.nonce)
	}

	async fn call_read_only(
		&self,
		contract_address: &str,
		contract_name: &str,
		function_name: &str,
		sender: &str,
		args: &[ClarityValue],
	) -> Result<ClarityValue, BlockChainError> {
		let url = format!(
			"{}/v2/contracts/call-read/{}/{}/{}",
			self.base_url,
			contract_address,
			contract_name,
			urlencoding::encode(function_name)
		);
		let body = json!({
			"sender": sender,
			"arguments": args.iter().map(|a| a.to_hex()).collect::<Vec<_>>(),
		});

		let response = self.http.post(&url).json(&body).send().await?;
		if !response.status().is_success() {
			return Err(BlockChainError::request_error(format!(
				"POST {} returned {}",
				url,
				response.status()
			)));
		}

		let result: ReadOnlyResponse = response.json().await?;
		match (result.okay, result.result) {
			(true, Some(hex)) => ClarityValue::from_hex(&hex).map_err(|e| {
				BlockChainError::request_error(format!("{} returned invalid value: {}", function_name, e))
			}),
			_ => Err(BlockChainError::contract_call_error(format!(
				"{}: {}",
				function_name,
				result.cause.unwrap_or_else(|| "no result".to_string())
			))),
		}
	}

	async fn broadcast_transaction(&self, payload: Vec<u8>) -> Result<String, BlockChainError> {
		let url = format!("{}/v2/transactions", self.base_url);
		let response = self
			.http
			.post(&url)
			.header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
			.body(payload)
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;

		if status.is_success() {
			let tx_id: String = serde_json::from_str(&body).unwrap_or_else(|_| body.trim().to_string());
			return Ok(with_hex_prefix(tx_id.trim_matches('"')));
		}

		let message = match serde_json::from_str::<BroadcastRejection>(&body) {
			Ok(rejection) => match rejection.reason {
				Some(reason) => format!("{} ({})", rejection.error, reason),
				None => rejection.error,
			},
			Err(_) => format!("{}: {}", status, body),
		};
		Err(BlockChainError::transaction_error(format!(
			"broadcast rejected: {}",
			message
		)))
	}
}

#[async_trait]
impl NonceSource for StacksClient {
	async fn chain_nonce(&self, identity: &SigningIdentity) -> Result<u64, NonceError> {
		Ok(self.get_account_nonce(&identity.address).await?)
	}
}
