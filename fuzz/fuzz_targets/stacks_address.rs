#![no_main]

use dlc_observer::models::StacksAddress;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
	if let Ok(input) = std::str::from_utf8(data) {
		if let Ok(address) = StacksAddress::from_string(input) {
			let rendered = address.to_string();
			assert_eq!(StacksAddress::from_string(&rendered), Ok(address));
		}
	}
});
