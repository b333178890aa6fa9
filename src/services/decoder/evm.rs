//! EVM log decoding.
//!
//! Logs are matched on their first topic against the DLC manager event
//! signatures and decoded with the `sol!` generated event types.

use alloy::{
	primitives::{Address, U256},
	sol_types::SolEvent,
};

use crate::{
	models::{
		CanonicalEvent, ChainTag, ContractId, DLCManager, Decoded, EVMLog, EventKind,
		IgnoreReason,
	},
	services::decoder::DecodeError,
};

/// Decoder bound to one DLC manager deployment
#[derive(Debug, Clone)]
pub struct EvmDecoder {
	chain: ChainTag,
	contract: Address,
}

fn outcome_to_i128(outcome: U256) -> Result<i128, DecodeError> {
	i128::try_from(outcome)
		.map_err(|_| DecodeError::field_error(format!("outcome {} does not fit i128", outcome)))
}

impl EvmDecoder {
	pub fn new(chain: ChainTag, contract: Address) -> Self {
		Self { chain, contract }
	}

	/// Turns one subscription log into a canonical event.
	///
	/// Never fails: logs of other contracts, reorged logs, unknown topics and
	/// undecodable data all come back as [`Decoded::Ignore`].
	pub fn decode(&self, log: &EVMLog) -> Decoded {
		if log.removed {
			return Decoded::Ignore(IgnoreReason::Removed);
		}
		if log.inner.address != self.contract {
			return Decoded::Ignore(IgnoreReason::OtherContract(format!(
				"{:#x}",
				log.inner.address
			)));
		}

		let tx_id = log
			.transaction_hash
			.map(|hash| format!("{:#x}", hash))
			.unwrap_or_default();

		match self.decode_kind(log) {
			Ok(Some(kind)) => Decoded::event(CanonicalEvent::new(self.chain, tx_id, kind)),
			Ok(None) => Decoded::Ignore(IgnoreReason::UnknownEvent(
				log.inner
					.data
					.topics()
					.first()
					.map(|topic| format!("{:#x}", topic))
					.unwrap_or_else(|| "anonymous".to_string()),
			)),
			Err(e) => Decoded::Ignore(e.into()),
		}
	}

	fn decode_kind(&self, log: &EVMLog) -> Result<Option<EventKind>, DecodeError> {
		let data = &log.inner.data;
		let Some(topic) = data.topics().first() else {
			return Ok(None);
		};

		let kind = if *topic == DLCManager::CreateDLC::SIGNATURE_HASH {
			let event = DLCManager::CreateDLC::decode_log_data(data)?;
			EventKind::ContractCreated {
				contract_id: ContractId::from_bytes(event.uuid.as_slice()),
				creator: event.creator.to_string(),
				protocol_wallet: Some(event.protocolWallet.to_string()),
				callback_contract: None,
				attestors: event.attestorList,
				maturation: None,
			}
		} else if *topic == DLCManager::SetStatusFunded::SIGNATURE_HASH {
			let event = DLCManager::SetStatusFunded::decode_log_data(data)?;
			EventKind::ContractFunded {
				contract_id: ContractId::from_bytes(event.uuid.as_slice()),
				creator: Some(event.creator.to_string()),
				protocol_wallet: Some(event.protocolWallet.to_string()),
				sender: Some(event.sender.to_string()),
			}
		} else if *topic == DLCManager::CloseDLC::SIGNATURE_HASH {
			let event = DLCManager::CloseDLC::decode_log_data(data)?;
			EventKind::ContractClosed {
				contract_id: ContractId::from_bytes(event.uuid.as_slice()),
				outcome: outcome_to_i128(event.outcome)?,
				creator: Some(event.creator.to_string()),
				protocol_wallet: Some(event.protocolWallet.to_string()),
				sender: Some(event.sender.to_string()),
			}
		} else if *topic == DLCManager::PostCloseDLC::SIGNATURE_HASH {
			let event = DLCManager::PostCloseDLC::decode_log_data(data)?;
			EventKind::ContractSettled {
				contract_id: ContractId::from_bytes(event.uuid.as_slice()),
				outcome: Some(outcome_to_i128(event.outcome)?),
				btc_tx_id: Some(event.btcTxId),
				creator: Some(event.creator.to_string()),
			}
		} else {
			return Ok(None);
		};

		Ok(Some(kind))
	}
}
