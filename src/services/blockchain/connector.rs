//! Opening chain clients from configuration.
//!
//! The listener never builds transports itself; it asks a [`ChainConnector`] for a fresh
//! client every time it (re)connects. Tests substitute their own connector.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::{
	models::ChainConfig,
	services::blockchain::{BlockChainClient, BlockChainError, EVMTransportClient, EvmClient},
};

/// Produces connected clients for a chain
#[async_trait]
pub trait ChainConnector: Send + Sync {
	type Client: BlockChainClient + 'static;

	/// Opens a new connection to the chain's endpoint
	///
	/// # Arguments
	/// * `chain` - Chain configuration holding the endpoint and timeouts
	///
	/// # Returns
	/// * `Result<Self::Client, BlockChainError>` - Connected client or `ConnectionError`
	async fn connect(&self, chain: &ChainConfig) -> Result<Self::Client, BlockChainError>;
}

/// Connector for EVM JSON-RPC endpoints over HTTP or WebSocket
#[derive(Clone, Debug, Default)]
pub struct EvmConnector;

#[async_trait]
impl ChainConnector for EvmConnector {
	type Client = EvmClient<EVMTransportClient>;

	async fn connect(&self, chain: &ChainConfig) -> Result<Self::Client, BlockChainError> {
		let metadata = Some(HashMap::from([
			("chain".to_string(), chain.slug.clone()),
			("endpoint".to_string(), chain.endpoint_label()),
		]));

		let url = chain.rpc_url.resolve().map_err(|e| {
			BlockChainError::connection_error(
				"Failed to resolve RPC URL",
				Some(e as Box<dyn std::error::Error + Send + Sync>),
				metadata.clone(),
			)
		})?;

		EvmClient::new(url.as_str(), chain.header_decoding(), chain.request_timeout())
			.await
			.map_err(|e| {
				BlockChainError::connection_error(
					format!("Failed to connect to {}", chain.endpoint_label()),
					Some(Box::new(e)),
					metadata,
				)
			})
	}
}
