//! Event to attestor request mapping.
//!
//! Created events become announcements and closed events become
//! attestations; every other event is only logged. A request for a
//! `(contract id, phase)` pair that is still in flight is skipped, so
//! duplicate deliveries never reach the attestor concurrently. Sequential
//! duplicates are forwarded, the attestor being idempotent on the id.

use std::{
	collections::HashSet,
	sync::{Arc, Mutex},
	time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::Instrument;

use crate::{
	models::{CanonicalEvent, ChainEndpoint, ChainTag, ContractId, EventKind, EventPhase},
	services::attestation::{Announcement, Attestation, AttestationError, AttestationService},
	utils::scale_outcome,
};

/// Per-endpoint parameters of dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchProfile {
	pub chain: ChainTag,
	/// Decimal places dropped from closing outcomes
	pub precision_shift: u32,
	/// Overrides the dispatcher's default maturation offset
	pub maturation_offset: Option<Duration>,
}

impl DispatchProfile {
	pub fn new(chain: ChainTag) -> Self {
		Self {
			chain,
			precision_shift: 0,
			maturation_offset: None,
		}
	}
}

impl From<&ChainEndpoint> for DispatchProfile {
	fn from(endpoint: &ChainEndpoint) -> Self {
		Self {
			chain: endpoint.chain,
			precision_shift: endpoint.precision_shift,
			maturation_offset: endpoint.maturation_offset,
		}
	}
}

type InFlightKey = (ContractId, EventPhase);

/// Removes its key from the in-flight set when dropped
struct InFlight<'a> {
	set: &'a Mutex<HashSet<InFlightKey>>,
	key: InFlightKey,
}

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		let mut set = self.set.lock().unwrap_or_else(|e| e.into_inner());
		set.remove(&self.key);
	}
}

pub struct AttestationDispatcher {
	attestor: Arc<dyn AttestationService>,
	default_maturation_offset: Duration,
	in_flight: Mutex<HashSet<InFlightKey>>,
}

impl AttestationDispatcher {
	pub fn new(attestor: Arc<dyn AttestationService>, default_maturation_offset: Duration) -> Self {
		Self {
			attestor,
			default_maturation_offset,
			in_flight: Mutex::new(HashSet::new()),
		}
	}

	/// The attestation capability requests are sent to.
	pub fn attestor(&self) -> &Arc<dyn AttestationService> {
		&self.attestor
	}

	/// Number of requests currently awaiting the attestor.
	pub fn in_flight(&self) -> usize {
		self.in_flight
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.len()
	}

	fn begin(&self, contract_id: &ContractId, phase: EventPhase) -> Option<InFlight<'_>> {
		let key = (contract_id.clone(), phase);
		let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
		if !set.insert(key.clone()) {
			return None;
		}
		Some(InFlight {
			set: &self.in_flight,
			key,
		})
	}

	/// Maturation of a new announcement: the explicit one, else now plus the
	/// profile's offset, else now plus the default offset.
	pub fn maturation_for(
		&self,
		profile: &DispatchProfile,
		explicit: Option<DateTime<Utc>>,
	) -> Result<DateTime<Utc>, AttestationError> {
		if let Some(maturation) = explicit {
			return Ok(maturation);
		}
		let offset = profile
			.maturation_offset
			.unwrap_or(self.default_maturation_offset);
		TimeDelta::from_std(offset)
			.ok()
			.and_then(|delta| Utc::now().checked_add_signed(delta))
			.ok_or_else(|| {
				AttestationError::internal_error(format!("maturation offset {:?} out of range", offset))
			})
	}

	/// Requests an announcement for a newly created contract.
	///
	/// # Returns
	/// * `Ok(None)` - An announcement for the same contract is already in flight
	pub async fn on_created(
		&self,
		profile: &DispatchProfile,
		contract_id: &ContractId,
		maturation: Option<DateTime<Utc>>,
	) -> Result<Option<Announcement>, AttestationError> {
		let Some(_guard) = self.begin(contract_id, EventPhase::Announcement) else {
			tracing::info!(contract_id = %contract_id, "announcement already in flight, skipping");
			return Ok(None);
		};

		let maturation = self.maturation_for(profile, maturation)?;
		let announcement = self
			.attestor
			.create_announcement(contract_id, profile.chain, Some(maturation))
			.await?;
		tracing::info!(
			chain = %profile.chain,
			contract_id = %contract_id,
			maturation = announcement.maturation.as_deref().unwrap_or_default(),
			"announcement created"
		);
		self.log_event(contract_id).await;
		Ok(Some(announcement))
	}

	/// Requests an attestation of a closed contract's outcome.
	///
	/// `outcome` is in chain precision; the profile's shift is applied first.
	///
	/// # Returns
	/// * `Ok(None)` - An attestation for the same contract is already in flight
	pub async fn on_closed(
		&self,
		profile: &DispatchProfile,
		contract_id: &ContractId,
		outcome: i128,
	) -> Result<Option<Attestation>, AttestationError> {
		let Some(_guard) = self.begin(contract_id, EventPhase::Attestation) else {
			tracing::info!(contract_id = %contract_id, "attestation already in flight, skipping");
			return Ok(None);
		};

		let scaled = scale_outcome(outcome, profile.precision_shift)?;
		let attestation = self.attestor.create_attestation(contract_id, scaled).await?;
		tracing::info!(
			chain = %profile.chain,
			contract_id = %contract_id,
			outcome = %scaled,
			"attestation created"
		);
		self.log_event(contract_id).await;
		Ok(Some(attestation))
	}

	async fn log_event(&self, contract_id: &ContractId) {
		match self.attestor.get_event(contract_id).await {
			Ok(event) => tracing::debug!(contract_id = %contract_id, ?event, "attestor event"),
			Err(e) => tracing::debug!(contract_id = %contract_id, error = %e, "event readback failed"),
		}
	}

	/// Routes one decoded event. Failures are logged and not retried.
	pub async fn dispatch(&self, profile: &DispatchProfile, event: &CanonicalEvent) {
		let span = tracing::info_span!(
			"dispatch",
			chain = %event.chain,
			tx_id = %event.tx_id,
			kind = event.kind_name()
		);
		if let Err(e) = self.route(profile, event).instrument(span).await {
			tracing::error!(
				contract_id = ?event.contract_id().map(|c| c.as_str()),
				error = %e,
				"dispatch failed"
			);
		}
	}

	async fn route(
		&self,
		profile: &DispatchProfile,
		event: &CanonicalEvent,
	) -> Result<(), AttestationError> {
		match &event.kind {
			EventKind::ContractCreated {
				contract_id,
				creator,
				attestors,
				maturation,
				..
			} => {
				tracing::info!(contract_id = %contract_id, creator = %creator, ?attestors, "new DLC request");
				self.on_created(profile, contract_id, *maturation)
					.await
					.map(|_| ())
			}
			EventKind::ContractClosed {
				contract_id,
				outcome,
				..
			} => {
				tracing::info!(contract_id = %contract_id, outcome = %outcome, "closing DLC");
				self.on_closed(profile, contract_id, *outcome)
					.await
					.map(|_| ())
			}
			EventKind::ContractFunded { contract_id, .. } => {
				tracing::info!(contract_id = %contract_id, "status set to funded");
				Ok(())
			}
			EventKind::ContractSettled {
				contract_id,
				btc_tx_id,
				..
			} => {
				tracing::info!(contract_id = %contract_id, ?btc_tx_id, "DLC closed");
				Ok(())
			}
			EventKind::Other { name, detail } => {
				tracing::info!(event = %name, ?detail, "contract registry event");
				Ok(())
			}
		}
	}
}
