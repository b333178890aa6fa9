use crate::properties::strategies::{chain_tag_strategy, stacks_address_strategy};

use dlc_observer::models::{blockchain::stacks::StacksAddress, ChainTag, ContractId};
use proptest::{prelude::*, test_runner::Config};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_chain_tag_text_form_is_stable(tag in chain_tag_strategy()) {
		let text = tag.to_string();
		prop_assert_eq!(text.parse::<ChainTag>().unwrap(), tag);
		prop_assert_eq!(text.to_ascii_uppercase().parse::<ChainTag>().unwrap(), tag);
		prop_assert!(text.starts_with("evm-") || text.starts_with("stx-"));
	}

	#[test]
	fn test_unprefixed_chain_tags_are_rejected(network in "[a-z0-9]{1,12}") {
		prop_assert!(network.parse::<ChainTag>().is_err());
	}

	#[test]
	fn test_stacks_address_text_form_is_stable(address in stacks_address_strategy()) {
		let text = address.to_string();
		prop_assert!(text.starts_with('S'));
		prop_assert_eq!(StacksAddress::from_string(&text).unwrap(), address);
	}

	#[test]
	fn test_contract_id_normalization(bytes in any::<[u8; 32]>(), upper in any::<bool>()) {
		let canonical = ContractId::from_bytes(&bytes);
		let received = if upper {
			format!(" 0X{} ", hex::encode_upper(bytes))
		} else {
			format!("0x{}", hex::encode(bytes))
		};

		let normalized = ContractId::new(received);
		prop_assert_eq!(&normalized, &canonical);
		prop_assert_eq!(normalized.to_bytes32(), Some(bytes));
	}
}
