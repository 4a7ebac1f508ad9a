//! Record extraction.
//!
//! Turns one block and one of its transactions into the [`TransactionRecord`] written to the
//! store. Extraction is pure: no I/O, and the same inputs always yield the same record.

mod error;

pub use error::ExtractionError;

use alloy::primitives::hex;
use chrono::{DateTime, SecondsFormat};
use std::collections::HashMap;

use crate::{
	models::{ChainConfig, EVMBlock, EVMTransaction, TransactionRecord},
	utils::{fee_in_native_units, to_native_units},
};

/// Normalizes a transaction of `block` into a record labelled for `chain`
///
/// # Arguments
/// * `block` - Block the transaction belongs to; provides the timestamp
/// * `tx` - Transaction to normalize
/// * `chain` - Chain the block was read from; provides the chain and token labels
///
/// # Returns
/// * `Result<TransactionRecord, ExtractionError>` - The record, or an error when the block
///   timestamp is out of range or an amount overflows
pub fn extract(
	block: &EVMBlock,
	tx: &EVMTransaction,
	chain: &ChainConfig,
) -> Result<TransactionRecord, ExtractionError> {
	let tx_hash = hex::encode_prefixed(tx.hash());
	let metadata = || {
		Some(HashMap::from([
			("chain".to_string(), chain.slug.clone()),
			("tx_hash".to_string(), tx_hash.clone()),
		]))
	};

	let timestamp = i64::try_from(block.timestamp())
		.ok()
		.and_then(|secs| DateTime::from_timestamp(secs, 0))
		.ok_or_else(|| {
			ExtractionError::missing_field(
				format!("Block timestamp {} is out of range", block.timestamp()),
				None,
				metadata(),
			)
		})?
		.to_rfc3339_opts(SecondsFormat::Secs, false);

	let amount = to_native_units(*tx.value()).map_err(|e| {
		ExtractionError::conversion("Transaction value overflows", Some(Box::new(e)), metadata())
	})?;

	let gas_fee = fee_in_native_units(*tx.gas(), tx.gas_price().copied()).map_err(|e| {
		ExtractionError::conversion("Gas fee overflows", Some(Box::new(e)), metadata())
	})?;

	let receiver = tx.to().map(|address| address.to_checksum(None));
	let contract_address = if tx.has_input() {
		receiver.clone()
	} else {
		None
	};

	Ok(TransactionRecord {
		timestamp,
		chain_name: chain.name.clone(),
		tx_hash,
		sender: tx.sender().map(|address| address.to_checksum(None)),
		receiver,
		amount,
		token_symbol: chain.token_symbol.clone(),
		gas_fee,
		contract_address,
	})
}

/// Extracts every transaction of `block` in block order
pub fn extract_block(
	block: &EVMBlock,
	chain: &ChainConfig,
) -> Result<Vec<TransactionRecord>, ExtractionError> {
	block
		.transactions
		.iter()
		.map(|tx| extract(block, tx, chain))
		.collect()
}
