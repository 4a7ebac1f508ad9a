//! EVM block data structures.

use alloy::primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

use super::EVMTransaction;
use crate::models::blockchain::{HeaderDecoding, HeaderDecodingError};

/// Largest `extraData` a standard header may carry
pub const MAX_STANDARD_EXTRA_DATA_LEN: usize = 32;

/// Block as returned by `eth_getBlockByNumber(number, true)`.
///
/// Only the fields the ingestor reads are required; everything a provider may omit is
/// optional or defaulted.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct BaseBlock<TX> {
	/// Hash of the block. None if pending.
	#[serde(default)]
	pub hash: Option<B256>,
	/// Hash of the parent
	#[serde(rename = "parentHash", default)]
	pub parent_hash: B256,
	/// Block number. None if pending.
	#[serde(default)]
	pub number: Option<U64>,
	/// Unix timestamp in seconds
	pub timestamp: U64,
	/// Miner/author's address.
	#[serde(rename = "miner", default)]
	pub author: Option<Address>,
	#[serde(rename = "gasUsed", default)]
	pub gas_used: U256,
	#[serde(rename = "gasLimit", default)]
	pub gas_limit: U256,
	/// Base fee per unit of gas (if past London)
	#[serde(
		rename = "baseFeePerGas",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub base_fee_per_gas: Option<U256>,
	/// Raw `extraData` header field
	#[serde(rename = "extraData", default)]
	pub extra_data: Bytes,
	/// Transactions in block order
	#[serde(default = "Vec::new")]
	pub transactions: Vec<TX>,
	/// Extra header bytes exposed when decoding in proof-of-authority mode
	#[serde(skip)]
	pub proof_of_authority_data: Option<Bytes>,
}

/// Wrapper around Base Block that implements additional functionality
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Block(pub BaseBlock<EVMTransaction>);

impl Block {
	/// Get the block number
	///
	/// Returns the block number as an `Option<u64>`.
	pub fn number(&self) -> Option<u64> {
		self.0.number.map(|n| n.to())
	}

	/// Block timestamp in seconds since the Unix epoch
	pub fn timestamp(&self) -> u64 {
		self.0.timestamp.to()
	}

	/// Applies the configured header decoding to a freshly deserialized block.
	///
	/// # Arguments
	/// * `decoding` - Decoding mode of the chain the block came from
	///
	/// # Returns
	/// * `Result<Block, HeaderDecodingError>` - The block, with `proof_of_authority_data` set
	///   in proof-of-authority mode, or an error when a standard header is oversized
	pub fn decode_header(mut self, decoding: HeaderDecoding) -> Result<Self, HeaderDecodingError> {
		match decoding {
			HeaderDecoding::Standard => {
				let len = self.0.extra_data.len();
				if len > MAX_STANDARD_EXTRA_DATA_LEN {
					return Err(HeaderDecodingError::OversizedExtraData {
						len,
						max: MAX_STANDARD_EXTRA_DATA_LEN,
					});
				}
			}
			HeaderDecoding::ProofOfAuthority => {
				self.0.proof_of_authority_data = Some(self.0.extra_data.clone());
			}
		}
		Ok(self)
	}
}

impl From<BaseBlock<EVMTransaction>> for Block {
	fn from(block: BaseBlock<EVMTransaction>) -> Self {
		Self(block)
	}
}

impl Deref for Block {
	type Target = BaseBlock<EVMTransaction>;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
