use crate::models::{EVMBaseTransaction, EVMTransaction};
use alloy::primitives::{Address, Bytes, B256, U256, U64};

/// A builder for creating test EVM transactions with default values.
#[derive(Debug, Default)]
pub struct TransactionBuilder {
	hash: Option<B256>,
	from: Option<Address>,
	to: Option<Address>,
	value: Option<U256>,
	input: Option<Bytes>,
	gas_price: Option<U256>,
	gas_limit: Option<U256>,
	nonce: Option<U256>,
	transaction_index: Option<u64>,
}

impl TransactionBuilder {
	/// Creates a new TransactionBuilder instance.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the hash of the transaction.
	pub fn hash(mut self, hash: B256) -> Self {
		self.hash = Some(hash);
		self
	}

	/// Sets the hash from a small integer, handy for ordering assertions.
	pub fn hash_from_u64(self, n: u64) -> Self {
		self.hash(B256::from(U256::from(n).to_be_bytes::<32>()))
	}

	/// Sets the sender address of the transaction.
	pub fn from(mut self, from: Address) -> Self {
		self.from = Some(from);
		self
	}

	/// Sets the recipient address of the transaction.
	pub fn to(mut self, to: Address) -> Self {
		self.to = Some(to);
		self
	}

	/// Sets the transaction value in smallest units.
	pub fn value(mut self, value: U256) -> Self {
		self.value = Some(value);
		self
	}

	/// Sets the transaction input data.
	pub fn input(mut self, input: Bytes) -> Self {
		self.input = Some(input);
		self
	}

	/// Sets the gas price.
	pub fn gas_price(mut self, gas_price: U256) -> Self {
		self.gas_price = Some(gas_price);
		self
	}

	/// Sets the gas limit for the transaction.
	pub fn gas_limit(mut self, gas_limit: U256) -> Self {
		self.gas_limit = Some(gas_limit);
		self
	}

	/// Sets the nonce for the transaction.
	pub fn nonce(mut self, nonce: U256) -> Self {
		self.nonce = Some(nonce);
		self
	}

	/// Sets the transaction index for the transaction.
	pub fn transaction_index(mut self, transaction_index: u64) -> Self {
		self.transaction_index = Some(transaction_index);
		self
	}

	/// Builds the Transaction instance.
	pub fn build(self) -> EVMTransaction {
		let default_gas_limit = U256::from(21000);

		let base_tx = EVMBaseTransaction {
			hash: self.hash.unwrap_or_default(),
			from: self.from,
			to: self.to,
			gas_price: self.gas_price,
			gas: self.gas_limit.unwrap_or(default_gas_limit),
			nonce: self.nonce.unwrap_or_default(),
			value: self.value.unwrap_or_default(),
			input: self.input.unwrap_or_default(),
			transaction_index: self.transaction_index.map(U64::from),
			..Default::default()
		};

		EVMTransaction(base_tx)
	}
}
