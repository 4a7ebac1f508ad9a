//! Core blockchain client interface.
//!
//! A client is bound to one chain endpoint for the lifetime of a connection. The listener
//! drops it and asks its [`ChainConnector`](super::ChainConnector) for a new one after a
//! connection-level failure.

use async_trait::async_trait;

use crate::{models::EVMBlock, services::blockchain::BlockChainError};

/// Defines the interface the listener needs from a chain
#[async_trait]
pub trait BlockChainClient: Send + Sync {
	/// Retrieves the latest block number from the blockchain
	///
	/// # Returns
	/// * `Result<u64, BlockChainError>` - The latest block number, or a `RequestError`
	///   on a transport or provider fault
	async fn get_latest_block_number(&self) -> Result<u64, BlockChainError>;

	/// Retrieves one block with its full transaction objects
	///
	/// # Arguments
	/// * `number` - The block number to fetch
	///
	/// # Returns
	/// * `Result<EVMBlock, BlockChainError>` - The block, `BlockNotFound` when the provider
	///   has no such block, `DecodeError` when the payload or header cannot be decoded, or
	///   `RequestError` on a transport fault
	async fn get_block_with_transactions(&self, number: u64) -> Result<EVMBlock, BlockChainError>;
}
