use crate::properties::strategies::{block_strategy, transaction_strategy, MAX_TIMESTAMP};

use alloy::primitives::hex;
use chain_ingestor::{
	services::extractor::{extract, extract_block},
	utils::tests::builders::{chain::ChainConfigBuilder, evm::block::BlockBuilder},
};
use chrono::DateTime;
use proptest::{prelude::*, test_runner::Config};
use rust_decimal::Decimal;

const NATIVE_DECIMALS: u32 = 18;

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	// Amounts are exact: scaling back by 10^18 gives the original wei value
	#[test]
	fn test_amount_is_exact(tx in transaction_strategy()) {
		let chain = ChainConfigBuilder::new().build();
		let block = BlockBuilder::new().build();
		let record = extract(&block, &tx, &chain).unwrap();

		let value = u128::try_from(*tx.value()).unwrap();
		let expected = Decimal::from_i128_with_scale(value as i128, NATIVE_DECIMALS);
		prop_assert_eq!(record.amount, expected);
	}

	#[test]
	fn test_gas_fee(tx in transaction_strategy()) {
		let chain = ChainConfigBuilder::new().build();
		let block = BlockBuilder::new().build();
		let record = extract(&block, &tx, &chain).unwrap();

		match tx.gas_price() {
			None => prop_assert_eq!(record.gas_fee, Decimal::ZERO),
			Some(price) => {
				let fee = u128::try_from(*tx.gas() * *price).unwrap();
				prop_assert_eq!(
					record.gas_fee,
					Decimal::from_i128_with_scale(fee as i128, NATIVE_DECIMALS)
				);
			}
		}
	}

	// Addresses and labels come straight from the transaction and the chain
	#[test]
	fn test_addresses_and_labels(tx in transaction_strategy()) {
		let chain = ChainConfigBuilder::new().name("BNB Smart Chain").token_symbol("BNB").build();
		let block = BlockBuilder::new().build();
		let record = extract(&block, &tx, &chain).unwrap();

		prop_assert_eq!(&record.tx_hash, &hex::encode_prefixed(tx.hash()));
		prop_assert_eq!(record.sender, tx.sender().map(|a| a.to_checksum(None)));
		prop_assert_eq!(&record.receiver, &tx.to().map(|a| a.to_checksum(None)));
		prop_assert_eq!(record.chain_name, "BNB Smart Chain");
		prop_assert_eq!(record.token_symbol, "BNB");

		let is_contract_call = tx.has_input() && tx.to().is_some();
		prop_assert_eq!(record.contract_address.is_some(), is_contract_call);
		if is_contract_call {
			prop_assert_eq!(record.contract_address, record.receiver);
		}
	}

	#[test]
	fn test_timestamp_is_utc_rfc3339(timestamp in 0..MAX_TIMESTAMP, tx in transaction_strategy()) {
		let chain = ChainConfigBuilder::new().build();
		let block = BlockBuilder::new().timestamp(timestamp).build();
		let record = extract(&block, &tx, &chain).unwrap();

		prop_assert!(record.timestamp.ends_with("+00:00"));
		let parsed = DateTime::parse_from_rfc3339(&record.timestamp).unwrap();
		prop_assert_eq!(parsed.timestamp(), timestamp as i64);
	}

	// One record per transaction, in block order, and the same every time
	#[test]
	fn test_extract_block_is_ordered_and_deterministic(block in block_strategy()) {
		let chain = ChainConfigBuilder::new().build();
		let first = extract_block(&block, &chain).unwrap();
		let second = extract_block(&block, &chain).unwrap();

		prop_assert_eq!(first.len(), block.transactions.len());
		for (record, tx) in first.iter().zip(block.transactions.iter()) {
			prop_assert_eq!(&record.tx_hash, &hex::encode_prefixed(tx.hash()));
		}
		prop_assert_eq!(first, second);
	}
}
