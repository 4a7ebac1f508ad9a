//! Parsing utilities

use byte_unit::Byte;
use std::str::FromStr;

/// Parses a human-readable size ("1GB", "500MB", "1024KiB") into a number of bytes.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	match Byte::from_str(s) {
		Ok(byte) => Ok(byte.as_u64()),
		Err(e) => Err(format!("Invalid size format: '{}'. Error: {}", s, e)),
	}
}

/// Normalizes a string by trimming whitespace and converting to lowercase.
pub fn normalize_string(input: &str) -> String {
	input.trim().to_lowercase()
}

/// Parses a `0x`-prefixed hex quantity as returned by JSON-RPC (e.g. `eth_blockNumber`).
pub fn parse_hex_quantity(value: &str) -> Result<u64, String> {
	let digits = value
		.strip_prefix("0x")
		.or_else(|| value.strip_prefix("0X"))
		.ok_or_else(|| format!("Quantity '{}' is missing the 0x prefix", value))?;
	if digits.is_empty() {
		return Err("Quantity has no digits".to_string());
	}
	u64::from_str_radix(digits, 16).map_err(|e| format!("Invalid quantity '{}': {}", value, e))
}
