use crate::properties::strategies::clarity_value_strategy;

use dlc_observer::models::ClarityValue;
use proptest::{prelude::*, test_runner::Config};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_serialized_values_decode_to_themselves(value in clarity_value_strategy()) {
		let decoded = ClarityValue::from_hex(&value.to_hex()).unwrap();
		prop_assert_eq!(decoded, value);
	}

	// Print events come from untrusted nodes
	#[test]
	fn test_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
		let _ = ClarityValue::deserialize(&bytes);
	}

	#[test]
	fn test_trailing_bytes_are_rejected(
		value in clarity_value_strategy(),
		extra in prop::collection::vec(any::<u8>(), 1..8)
	) {
		let mut bytes = value.serialize();
		bytes.extend_from_slice(&extra);
		prop_assert!(ClarityValue::deserialize(&bytes).is_err());
	}
}
