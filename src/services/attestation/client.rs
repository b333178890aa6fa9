//! HTTP attestor client.
//!
//! Talks to an attestor service exposing
//! `POST /create-announcement/{uuid}`, `POST /create-attestation/{uuid}/{outcome}`,
//! `GET /event/{uuid}`, `GET /events`, `GET /publickey` and `GET /health`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{json, Value};

use crate::{
	models::{ChainTag, ContractId},
	services::attestation::{Announcement, Attestation, AttestationError, AttestationService},
};

pub struct HttpAttestor {
	http: ClientWithMiddleware,
	base_url: String,
}

impl HttpAttestor {
	pub fn new(http: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
		Self {
			http,
			base_url: base_url.into().trim_end_matches('/').to_string(),
		}
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	async fn checked(
		&self,
		request: reqwest_middleware::RequestBuilder,
		what: &str,
	) -> Result<reqwest::Response, AttestationError> {
		let response = request.send().await?;
		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}
		let body = response.text().await.unwrap_or_default();
		Err(AttestationError::response_error(format!(
			"{} returned {}: {}",
			what, status, body
		)))
	}

	/// Body as JSON, or as a JSON string when the attestor answered with text.
	async fn json_or_text(response: reqwest::Response) -> Result<Value, AttestationError> {
		let text = response.text().await?;
		Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
	}
}

#[async_trait]
impl AttestationService for HttpAttestor {
	async fn create_announcement(
		&self,
		contract_id: &ContractId,
		chain: ChainTag,
		maturation: Option<DateTime<Utc>>,
	) -> Result<Announcement, AttestationError> {
		let url = format!(
			"{}/create-announcement/{}",
			self.base_url,
			urlencoding::encode(contract_id.as_str())
		);
		let maturation = maturation.map(|m| m.to_rfc3339_opts(SecondsFormat::Millis, true));
		let body = json!({ "maturation": maturation, "chain": chain });

		let response = self
			.checked(self.http.post(&url).json(&body), "create-announcement")
			.await?;
		let reply = Self::json_or_text(response).await?;

		Ok(Announcement {
			uuid: contract_id.clone(),
			maturation: reply
				.get("maturation")
				.and_then(|m| m.as_str())
				.map(str::to_string)
				.or(maturation),
		})
	}

	async fn create_attestation(
		&self,
		contract_id: &ContractId,
		outcome: i128,
	) -> Result<Attestation, AttestationError> {
		let url = format!(
			"{}/create-attestation/{}/{}",
			self.base_url,
			urlencoding::encode(contract_id.as_str()),
			outcome
		);
		self.checked(self.http.post(&url), "create-attestation")
			.await?;

		Ok(Attestation {
			uuid: contract_id.clone(),
			outcome,
		})
	}

	async fn get_event(&self, contract_id: &ContractId) -> Result<Option<Value>, AttestationError> {
		let url = format!(
			"{}/event/{}",
			self.base_url,
			urlencoding::encode(contract_id.as_str())
		);
		let response = self.http.get(&url).send().await?;
		if response.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}
		if !response.status().is_success() {
			return Err(AttestationError::response_error(format!(
				"event returned {}",
				response.status()
			)));
		}
		match Self::json_or_text(response).await? {
			Value::Null => Ok(None),
			event => Ok(Some(event)),
		}
	}

	async fn get_all_events(&self) -> Result<Value, AttestationError> {
		let url = format!("{}/events", self.base_url);
		let response = self.checked(self.http.get(&url), "events").await?;
		Self::json_or_text(response).await
	}

	async fn get_public_key(&self) -> Result<String, AttestationError> {
		let url = format!("{}/publickey", self.base_url);
		let response = self.checked(self.http.get(&url), "publickey").await?;
		match Self::json_or_text(response).await? {
			Value::String(key) => Ok(key),
			other => Ok(other.to_string()),
		}
	}

	async fn get_health(&self) -> Result<Value, AttestationError> {
		let url = format!("{}/health", self.base_url);
		let response = self.checked(self.http.get(&url), "health").await?;
		Self::json_or_text(response).await
	}
}
