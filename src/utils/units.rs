//! Native unit conversion.
//!
//! Both supported chains denominate their native asset in 10^18 smallest units (wei).

use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Number of decimals between the smallest native unit and the display unit
pub const NATIVE_DECIMALS: u32 = 18;

const UNITS_PER_NATIVE: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UnitConversionError {
	#[error("Value {0} does not fit in a decimal amount")]
	Overflow(U256),
}

/// Converts an amount in smallest units to native units (`value / 10^18`).
///
/// The fractional part is kept exactly. Very large values keep their whole part and lose
/// trailing fractional digits once the 28 digit decimal precision is exhausted.
pub fn to_native_units(value: U256) -> Result<Decimal, UnitConversionError> {
	let divisor = U256::from(UNITS_PER_NATIVE);
	let whole = value / divisor;
	let fraction = value % divisor;

	let whole = u128::try_from(whole)
		.ok()
		.and_then(|w| i128::try_from(w).ok())
		.and_then(|w| Decimal::try_from_i128_with_scale(w, 0).ok())
		.ok_or(UnitConversionError::Overflow(value))?;
	let fraction = u64::try_from(fraction)
		.ok()
		.and_then(|f| i64::try_from(f).ok())
		.map(|f| Decimal::new(f, NATIVE_DECIMALS))
		.ok_or(UnitConversionError::Overflow(value))?;

	whole
		.checked_add(fraction)
		.ok_or(UnitConversionError::Overflow(value))
}

/// Computes `gas * gas_price` in native units. A missing price yields zero.
pub fn fee_in_native_units(
	gas: U256,
	gas_price: Option<U256>,
) -> Result<Decimal, UnitConversionError> {
	match gas_price {
		Some(price) => {
			let fee = gas
				.checked_mul(price)
				.ok_or(UnitConversionError::Overflow(gas))?;
			to_native_units(fee)
		}
		None => Ok(Decimal::ZERO),
	}
}
