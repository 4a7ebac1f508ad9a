//! EVM transaction data structures.

use std::{collections::HashMap, ops::Deref};

use alloy::primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// Transaction object embedded in a full block payload.
///
/// Fields a provider may omit are optional. Non-standard fields (L2 deposit data and
/// similar) are kept in `extra`.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct BaseTransaction {
	/// Hash
	pub hash: B256,
	/// Nonce
	#[serde(default)]
	pub nonce: U256,
	/// Block hash. None when pending.
	#[serde(rename = "blockHash", default)]
	pub block_hash: Option<B256>,
	/// Block number. None when pending.
	#[serde(rename = "blockNumber", default)]
	pub block_number: Option<U64>,
	/// Transaction Index. None when pending.
	#[serde(rename = "transactionIndex", default)]
	pub transaction_index: Option<U64>,
	/// Sender
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub from: Option<Address>,
	/// Recipient (None when contract creation)
	#[serde(default)]
	pub to: Option<Address>,
	/// Transferred value
	#[serde(default)]
	pub value: U256,
	/// Gas Price. Some providers omit it for EIP-1559 transactions.
	#[serde(rename = "gasPrice", default)]
	pub gas_price: Option<U256>,
	/// Gas limit
	#[serde(default)]
	pub gas: U256,
	/// Input data
	#[serde(default, alias = "data")]
	pub input: Bytes,
	/// Transaction type, None for Legacy
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub transaction_type: Option<U64>,
	/// Max fee per gas
	#[serde(
		rename = "maxFeePerGas",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub max_fee_per_gas: Option<U256>,
	/// miner bribe
	#[serde(
		rename = "maxPriorityFeePerGas",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub max_priority_fee_per_gas: Option<U256>,

	/// Catch-all for non-standard fields
	#[serde(flatten)]
	pub extra: HashMap<String, serde_json::Value>,
}

/// Wrapper around Base Transaction that implements additional functionality
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Transaction(pub BaseTransaction);

impl Transaction {
	/// Get the transaction value in smallest units
	pub fn value(&self) -> &U256 {
		&self.0.value
	}

	/// Get the transaction sender address
	pub fn sender(&self) -> Option<&Address> {
		self.0.from.as_ref()
	}

	/// Get the transaction recipient address (None for contract creation)
	pub fn to(&self) -> Option<&Address> {
		self.0.to.as_ref()
	}

	/// Get the gas limit for the transaction
	pub fn gas(&self) -> &U256 {
		&self.0.gas
	}

	/// Get the gas price
	pub fn gas_price(&self) -> Option<&U256> {
		self.0.gas_price.as_ref()
	}

	/// Get the transaction hash
	pub fn hash(&self) -> &B256 {
		&self.0.hash
	}

	/// Whether the transaction carried call data
	pub fn has_input(&self) -> bool {
		!self.0.input.is_empty()
	}
}

impl From<BaseTransaction> for Transaction {
	fn from(tx: BaseTransaction) -> Self {
		Self(tx)
	}
}

impl Deref for Transaction {
	type Target = BaseTransaction;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
