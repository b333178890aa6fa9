#![no_main]

use dlc_observer::models::ClarityValue;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
	if let Ok(value) = ClarityValue::deserialize(data) {
		// tuples are re-keyed on decode, so compare values rather than bytes
		assert_eq!(ClarityValue::deserialize(&value.serialize()), Ok(value));
	}
});
