use crate::models::{EVMBaseBlock, EVMBlock, EVMTransaction};
use alloy::primitives::{Bytes, B256, U256, U64};

/// A builder for creating test EVM blocks.
///
/// Defaults to block 1 at timestamp 1_700_000_000 with no transactions.
#[derive(Debug)]
pub struct BlockBuilder {
	number: Option<u64>,
	timestamp: u64,
	extra_data: Bytes,
	transactions: Vec<EVMTransaction>,
}

impl Default for BlockBuilder {
	fn default() -> Self {
		Self {
			number: Some(1),
			timestamp: 1_700_000_000,
			extra_data: Bytes::new(),
			transactions: vec![],
		}
	}
}

impl BlockBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn number(mut self, number: u64) -> Self {
		self.number = Some(number);
		self
	}

	/// Builds a pending block without a number
	pub fn pending(mut self) -> Self {
		self.number = None;
		self
	}

	pub fn timestamp(mut self, timestamp: u64) -> Self {
		self.timestamp = timestamp;
		self
	}

	pub fn extra_data(mut self, extra_data: Bytes) -> Self {
		self.extra_data = extra_data;
		self
	}

	pub fn transaction(mut self, transaction: EVMTransaction) -> Self {
		self.transactions.push(transaction);
		self
	}

	pub fn transactions(mut self, transactions: Vec<EVMTransaction>) -> Self {
		self.transactions = transactions;
		self
	}

	pub fn build(self) -> EVMBlock {
		EVMBlock(EVMBaseBlock {
			hash: self.number.map(|n| B256::from(U256::from(n).to_be_bytes::<32>())),
			number: self.number.map(U64::from),
			timestamp: U64::from(self.timestamp),
			extra_data: self.extra_data,
			transactions: self.transactions,
			..Default::default()
		})
	}
}
