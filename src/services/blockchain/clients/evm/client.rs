//! EVM-compatible blockchain client implementation.
//!
//! Reads the chain head and full blocks over any [`BlockchainTransport`], and applies the
//! chain's header decoding mode to every block it returns.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::instrument;

use crate::{
	models::{EVMBlock, HeaderDecoding},
	services::blockchain::{
		client::BlockChainClient,
		transports::{BlockchainTransport, EVMTransportClient},
		BlockChainError,
	},
	utils::parse_hex_quantity,
};

/// Client implementation for Ethereum Virtual Machine (EVM) compatible blockchains
#[derive(Clone)]
pub struct EvmClient<T: Send + Sync> {
	/// The underlying transport client for RPC communication
	transport: T,
	/// Header decoding mode of the chain this client is bound to
	decoding: HeaderDecoding,
}

impl<T: Send + Sync> EvmClient<T> {
	/// Creates a new EVM client instance with a specific transport client
	pub fn new_with_transport(transport: T, decoding: HeaderDecoding) -> Self {
		Self {
			transport,
			decoding,
		}
	}

	pub fn header_decoding(&self) -> HeaderDecoding {
		self.decoding
	}
}

impl EvmClient<EVMTransportClient> {
	/// Creates a new EVM client, opening the transport that matches the URL scheme
	///
	/// # Arguments
	/// * `url` - Resolved endpoint URL
	/// * `decoding` - Header decoding mode of the chain
	/// * `request_timeout` - Per-request timeout for HTTP endpoints
	///
	/// # Returns
	/// * `Result<Self, BlockChainError>` - New client instance or `ConnectionError`
	pub async fn new(
		url: &str,
		decoding: HeaderDecoding,
		request_timeout: std::time::Duration,
	) -> Result<Self, BlockChainError> {
		let transport = EVMTransportClient::new(url, request_timeout)
			.await
			.map_err(|e| {
				BlockChainError::connection_error(
					"Failed to connect to chain endpoint",
					Some(Box::new(e)),
					None,
				)
			})?;
		Ok(Self::new_with_transport(transport, decoding))
	}
}

/// Returns the `result` member of a JSON-RPC response, mapping a JSON-RPC `error` member
/// to a `RequestError`
fn extract_result(
	response: &Value,
	method: &str,
	metadata: Option<HashMap<String, String>>,
) -> Result<Value, BlockChainError> {
	if let Some(error) = response.get("error") {
		return Err(BlockChainError::request_error(
			format!("{} returned an error: {}", method, error),
			None,
			metadata,
		));
	}
	response.get("result").cloned().ok_or_else(|| {
		BlockChainError::request_error(
			format!("{} response is missing the 'result' field", method),
			None,
			metadata,
		)
	})
}

#[async_trait]
impl<T: Send + Sync + BlockchainTransport> BlockChainClient for EvmClient<T> {
	#[instrument(skip(self))]
	async fn get_latest_block_number(&self) -> Result<u64, BlockChainError> {
		let response = self
			.transport
			.send_raw_request::<Value>("eth_blockNumber", None)
			.await
			.map_err(|e| {
				BlockChainError::request_error(
					"Failed to get latest block number",
					Some(Box::new(e)),
					None,
				)
			})?;

		let result = extract_result(&response, "eth_blockNumber", None)?;
		let hex_str = result.as_str().ok_or_else(|| {
			BlockChainError::request_error("eth_blockNumber result is not a string", None, None)
		})?;

		parse_hex_quantity(hex_str).map_err(|e| {
			BlockChainError::request_error(
				format!("Failed to parse block number: {}", e),
				None,
				None,
			)
		})
	}

	#[instrument(skip(self))]
	async fn get_block_with_transactions(&self, number: u64) -> Result<EVMBlock, BlockChainError> {
		let metadata = || Some(HashMap::from([("block".to_string(), number.to_string())]));
		// `true` requests full transaction objects
		let params = json!([format!("0x{:x}", number), true]);

		let response = self
			.transport
			.send_raw_request("eth_getBlockByNumber", Some(params))
			.await
			.map_err(|e| {
				BlockChainError::request_error(
					format!("Failed to get block {}", number),
					Some(Box::new(e)),
					metadata(),
				)
			})?;

		let block_data = extract_result(&response, "eth_getBlockByNumber", metadata())?;
		if block_data.is_null() {
			return Err(BlockChainError::block_not_found(
				number.to_string(),
				None,
				metadata(),
			));
		}

		let block: EVMBlock = serde_json::from_value(block_data).map_err(|e| {
			BlockChainError::decode_error(
				format!("Failed to parse block {}", number),
				Some(Box::new(e)),
				metadata(),
			)
		})?;

		block.decode_header(self.decoding).map_err(|e| {
			BlockChainError::decode_error(
				format!("Failed to decode header of block {}", number),
				Some(Box::new(e)),
				metadata(),
			)
		})
	}
}
