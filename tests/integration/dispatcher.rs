//! Attestation dispatch against a scripted attestor.

use std::{
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
	time::Duration,
};

use chrono::Utc;
use dlc_observer::{
	models::{CanonicalEvent, ChainTag, ContractId, EventKind, StacksNetwork},
	services::attestation::{
		Announcement, Attestation, AttestationDispatcher, AttestationError, DispatchProfile,
	},
};

use crate::integration::mocks::{allow_event_readback, MockAttestor};

const CHAIN: ChainTag = ChainTag::Stacks(StacksNetwork::Testnet);

fn profile(precision_shift: u32) -> DispatchProfile {
	DispatchProfile {
		chain: CHAIN,
		precision_shift,
		maturation_offset: Some(Duration::from_secs(3600)),
	}
}

fn closed(contract_id: &ContractId, outcome: i128) -> CanonicalEvent {
	CanonicalEvent::new(
		CHAIN,
		"0xbeef",
		EventKind::ContractClosed {
			contract_id: contract_id.clone(),
			outcome,
			creator: None,
			protocol_wallet: None,
			sender: None,
		},
	)
}

#[tokio::test]
async fn test_created_event_is_announced_with_endpoint_offset() {
	let contract_id = ContractId::new("0x01");
	let before = Utc::now();

	let mut attestor = MockAttestor::new();
	let expected = contract_id.clone();
	attestor
		.expect_create_announcement()
		.withf(move |id, chain, maturation| {
			let maturation = maturation.expect("maturation is always set");
			let offset = maturation - before;
			*id == expected
				&& *chain == CHAIN
				&& offset >= chrono::TimeDelta::seconds(3600)
				&& offset < chrono::TimeDelta::seconds(3660)
		})
		.times(1)
		.returning(|id, _, maturation| {
			Ok(Announcement {
				uuid: id.clone(),
				maturation: maturation.map(|m| m.to_rfc3339()),
			})
		});
	allow_event_readback(&mut attestor);

	let dispatcher = AttestationDispatcher::new(Arc::new(attestor), Duration::from_secs(86_400));
	let event = CanonicalEvent::new(
		CHAIN,
		"0xbeef",
		EventKind::ContractCreated {
			contract_id,
			creator: "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM".to_string(),
			protocol_wallet: None,
			callback_contract: None,
			attestors: vec!["https://attestor-1.dlc.link".to_string()],
			maturation: None,
		},
	);
	dispatcher.dispatch(&profile(0), &event).await;
}

#[tokio::test]
async fn test_closed_outcome_is_rounded_to_attestor_precision() {
	let mut attestor = MockAttestor::new();
	attestor
		.expect_create_attestation()
		.withf(|id, outcome| *id == ContractId::new("0x02") && *outcome == 101)
		.times(1)
		.returning(|id, outcome| {
			Ok(Attestation {
				uuid: id.clone(),
				outcome,
			})
		});
	attestor
		.expect_create_attestation()
		.withf(|id, outcome| *id == ContractId::new("0x03") && *outcome == -1)
		.times(1)
		.returning(|id, outcome| {
			Ok(Attestation {
				uuid: id.clone(),
				outcome,
			})
		});
	allow_event_readback(&mut attestor);

	let dispatcher = AttestationDispatcher::new(Arc::new(attestor), Duration::from_secs(60));
	dispatcher
		.dispatch(&profile(2), &closed(&ContractId::new("0x02"), 10_050))
		.await;
	dispatcher
		.dispatch(&profile(2), &closed(&ContractId::new("0x03"), -150))
		.await;
	assert_eq!(dispatcher.in_flight(), 0);
}

#[tokio::test]
async fn test_failed_attestation_can_be_retried() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();

	let mut attestor = MockAttestor::new();
	attestor
		.expect_create_attestation()
		.times(2)
		.returning(move |id, outcome| {
			if counter.fetch_add(1, Ordering::SeqCst) == 0 {
				Err(AttestationError::response_error("attestor returned 503"))
			} else {
				Ok(Attestation {
					uuid: id.clone(),
					outcome,
				})
			}
		});
	allow_event_readback(&mut attestor);

	let dispatcher = AttestationDispatcher::new(Arc::new(attestor), Duration::from_secs(60));
	let contract_id = ContractId::new("0x04");

	assert!(dispatcher
		.on_closed(&profile(0), &contract_id, 5)
		.await
		.is_err());
	let attestation = dispatcher
		.on_closed(&profile(0), &contract_id, 5)
		.await
		.unwrap()
		.unwrap();
	assert_eq!(attestation.outcome, 5);
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_funded_and_settled_events_do_not_reach_the_attestor() {
	let dispatcher =
		AttestationDispatcher::new(Arc::new(MockAttestor::new()), Duration::from_secs(60));
	let contract_id = ContractId::new("0x05");

	for kind in [
		EventKind::ContractFunded {
			contract_id: contract_id.clone(),
			creator: None,
			protocol_wallet: None,
			sender: None,
		},
		EventKind::ContractSettled {
			contract_id: contract_id.clone(),
			outcome: Some(1),
			btc_tx_id: Some("btc".to_string()),
			creator: None,
		},
		EventKind::Other {
			name: "register-contract".to_string(),
			detail: None,
		},
	] {
		dispatcher
			.dispatch(&profile(0), &CanonicalEvent::new(CHAIN, "0xbeef", kind))
			.await;
	}
}
