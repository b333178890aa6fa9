use dlc_observer::utils::{scale_outcome, PrecisionError};
use proptest::{prelude::*, test_runner::Config};

const BOUND: i128 = 1_000_000_000_000_000_000_000_000_000_000;

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	// Nearest integer, halves toward positive infinity: floor((2v + d) / 2d)
	#[test]
	fn test_matches_round_half_up(value in -BOUND..BOUND, shift in 0u32..=8) {
		let divisor = 10i128.pow(shift);
		let reference = (2 * value + divisor).div_euclid(2 * divisor);
		prop_assert_eq!(scale_outcome(value, shift), Ok(reference));
	}

	#[test]
	fn test_zero_shift_is_identity(value in any::<i128>()) {
		prop_assert_eq!(scale_outcome(value, 0), Ok(value));
	}

	#[test]
	fn test_result_is_within_half_a_unit(value in -BOUND..BOUND, shift in 1u32..=8) {
		let divisor = 10i128.pow(shift);
		let scaled = scale_outcome(value, shift).unwrap();
		let error = (scaled * divisor - value).abs();
		prop_assert!(2 * error <= divisor);
	}

	#[test]
	fn test_oversized_shift_is_rejected(value in any::<i128>(), shift in 39u32..200) {
		prop_assert_eq!(scale_outcome(value, shift), Err(PrecisionError::ShiftTooLarge(shift)));
	}
}
