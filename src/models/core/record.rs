use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One normalized transaction, the unit of persistence.
///
/// Field names on disk are the ones downstream tooling reads and must not change.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TransactionRecord {
	/// Block time, RFC 3339 in UTC with a `+00:00` offset
	#[serde(rename = "Timestamp")]
	pub timestamp: String,

	#[serde(rename = "Blockchain Type")]
	pub chain_name: String,

	/// `0x`-prefixed lowercase hex
	#[serde(rename = "Transaction Hash")]
	pub tx_hash: String,

	/// Checksummed sender address
	#[serde(rename = "Sender Address")]
	pub sender: Option<String>,

	/// Checksummed receiver address, absent for contract creation
	#[serde(rename = "Receiver Address")]
	pub receiver: Option<String>,

	/// Transferred value in native units
	#[serde(rename = "Amount", with = "rust_decimal::serde::float")]
	pub amount: Decimal,

	#[serde(rename = "Token Type")]
	pub token_symbol: String,

	/// `gas * gas_price` in native units
	#[serde(rename = "Gas Fee", with = "rust_decimal::serde::float")]
	pub gas_fee: Decimal,

	/// The receiver when the transaction carried call data
	#[serde(rename = "Smart Contract Address")]
	pub contract_address: Option<String>,
}
