//! Stacks print-event decoding.
//!
//! A transaction detail document is checked for success and finality, then
//! every print event the watched contract emitted is unwrapped on its own.
//! Print events carry a tuple with an `event-source` of the form
//! `dlclink:{name}:v1`; only names in [`EVENT_NAMES`] are decoded.

use crate::{
	models::{
		blockchain::stacks::TransactionEvent, CanonicalEvent, ChainTag, ClarityValue, ContractId,
		Decoded, EventKind, IgnoreReason, TransactionDetail,
	},
	services::decoder::DecodeError,
	utils::constants::{EVENT_SOURCE_PREFIX, EVENT_SOURCE_VERSION},
};

/// Print events the DLC manager emits
pub const EVENT_NAMES: &[&str] = &[
	"create-dlc",
	"close-dlc",
	"set-status-funded",
	"post-close-dlc",
	"register-contract",
	"unregister-contract",
];

/// Decoder bound to one `{deployer}.{contract}` identifier
#[derive(Debug, Clone)]
pub struct StacksDecoder {
	chain: ChainTag,
	contract_identifier: String,
}

/// Splits `dlclink:{name}:v1` into `name` when the prefix and version match.
pub fn parse_event_source(source: &str) -> Option<&str> {
	let mut parts = source.split(':');
	let (prefix, name, version) = (parts.next()?, parts.next()?, parts.next()?);
	if parts.next().is_some() || prefix != EVENT_SOURCE_PREFIX || version != EVENT_SOURCE_VERSION {
		return None;
	}
	Some(name)
}

fn required<'a>(event: &'a ClarityValue, key: &str) -> Result<&'a ClarityValue, DecodeError> {
	event
		.get(key)
		.ok_or_else(|| DecodeError::field_error(format!("missing field '{}'", key)))
}

fn contract_id(event: &ClarityValue) -> Result<ContractId, DecodeError> {
	required(event, "uuid")?
		.as_buffer()
		.map(ContractId::from_bytes)
		.ok_or_else(|| DecodeError::field_error("uuid is not a buffer"))
}

fn principal(event: &ClarityValue, key: &str) -> Option<String> {
	event.get(key).and_then(|v| v.as_principal())
}

fn text(event: &ClarityValue, key: &str) -> Option<String> {
	event.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Attestor domains of a `create-dlc` print: a list of `{dns: string}` tuples.
fn attestors(event: &ClarityValue) -> Vec<String> {
	event
		.get("attestors")
		.and_then(|v| v.as_list())
		.map(|items| {
			items
				.iter()
				.filter_map(|item| item.unwrapped().get("dns").and_then(|d| d.as_str()))
				.map(str::to_string)
				.collect()
		})
		.unwrap_or_default()
}

impl StacksDecoder {
	pub fn new(chain: ChainTag, contract_identifier: impl Into<String>) -> Self {
		Self {
			chain,
			contract_identifier: contract_identifier.into(),
		}
	}

	pub fn contract_identifier(&self) -> &str {
		&self.contract_identifier
	}

	/// Decodes every relevant print event of `detail`, in emission order.
	///
	/// A failed or unanchored transaction yields a single ignore verdict and
	/// no events.
	pub fn decode(&self, detail: &TransactionDetail) -> Vec<Decoded> {
		if !detail.is_success() {
			return vec![Decoded::Ignore(IgnoreReason::NotSuccessful(
				detail.tx_status.clone(),
			))];
		}
		if !detail.is_final() {
			return vec![Decoded::Ignore(IgnoreReason::NotFinal)];
		}

		let decoded: Vec<Decoded> = detail
			.events
			.iter()
			.filter_map(|event| match event {
				TransactionEvent::SmartContractLog { contract_log, .. } => Some(contract_log),
				TransactionEvent::Other => None,
			})
			.map(|log| {
				if log.contract_id != self.contract_identifier {
					return Decoded::Ignore(IgnoreReason::OtherContract(log.contract_id.clone()));
				}
				match self.decode_print(&log.value.hex) {
					Ok(Some(kind)) => {
						Decoded::event(CanonicalEvent::new(self.chain, detail.tx_id.clone(), kind))
					}
					Ok(None) => Decoded::Ignore(IgnoreReason::UnknownEvent(
						log.value.repr.clone().unwrap_or_default(),
					)),
					Err(e) => Decoded::Ignore(e.into()),
				}
			})
			.collect();

		if decoded.is_empty() {
			return vec![Decoded::Ignore(IgnoreReason::NoEvents)];
		}
		decoded
	}

	/// Unwraps one print value.
	///
	/// # Returns
	/// * `Ok(None)` - The print is not a DLC manager event
	fn decode_print(&self, hex: &str) -> Result<Option<EventKind>, DecodeError> {
		let event = ClarityValue::from_hex(hex)?;
		let Some(name) = event
			.get("event-source")
			.and_then(|v| v.as_str())
			.and_then(parse_event_source)
		else {
			return Ok(None);
		};
		if !EVENT_NAMES.contains(&name) {
			return Ok(None);
		}

		let kind = match name {
			"create-dlc" => EventKind::ContractCreated {
				contract_id: contract_id(&event)?,
				creator: principal(&event, "creator")
					.ok_or_else(|| DecodeError::field_error("creator is not a principal"))?,
				protocol_wallet: principal(&event, "protocol-wallet"),
				callback_contract: principal(&event, "callback-contract"),
				attestors: attestors(&event),
				maturation: None,
			},
			"close-dlc" => EventKind::ContractClosed {
				contract_id: contract_id(&event)?,
				outcome: required(&event, "outcome")?
					.as_i128()
					.ok_or_else(|| DecodeError::field_error("outcome is not an integer"))?,
				creator: principal(&event, "creator"),
				protocol_wallet: None,
				sender: None,
			},
			"set-status-funded" => EventKind::ContractFunded {
				contract_id: contract_id(&event)?,
				creator: principal(&event, "creator"),
				protocol_wallet: principal(&event, "protocol-wallet"),
				sender: principal(&event, "sender"),
			},
			"post-close-dlc" => EventKind::ContractSettled {
				contract_id: contract_id(&event)?,
				outcome: event.get("outcome").and_then(|v| v.as_i128()),
				btc_tx_id: text(&event, "btc-tx-id"),
				creator: principal(&event, "creator"),
			},
			other => EventKind::Other {
				name: other.to_string(),
				detail: principal(&event, "contract-address"),
			},
		};

		Ok(Some(kind))
	}
}
