//! Outcome precision conversion.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrecisionError {
	#[error("precision shift {0} does not fit a 128 bit divisor")]
	ShiftTooLarge(u32),
}

/// Divides a chain native outcome by `10^shift`, rounding to the nearest
/// integer with halves going toward positive infinity.
///
/// # Arguments
/// * `value` - Outcome in chain native precision
/// * `shift` - Decimal places to drop
///
/// # Returns
/// * `Result<i128, PrecisionError>` - The scaled outcome
pub fn scale_outcome(value: i128, shift: u32) -> Result<i128, PrecisionError> {
	let divisor = 10i128
		.checked_pow(shift)
		.ok_or(PrecisionError::ShiftTooLarge(shift))?;
	let quotient = value.div_euclid(divisor);
	let remainder = value.rem_euclid(divisor);
	// remainder >= divisor / 2, without overflowing on large divisors
	if remainder >= divisor - remainder {
		Ok(quotient + 1)
	} else {
		Ok(quotient)
	}
}
