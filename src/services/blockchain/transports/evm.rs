//! EVM transport selection.
//!
//! EVM endpoints speak the same JSON-RPC over either HTTP or WebSocket; the scheme of the
//! configured URL decides which transport is opened.

use serde::Serialize;
use serde_json::Value;
use std::{collections::HashMap, time::Duration};
use url::Url;

use crate::{
	services::blockchain::transports::{
		redact_url, BlockchainTransport, HttpTransportClient, TransportError, WsTransportClient,
	},
	utils::http::RetryConfig,
};

/// Transport used by EVM clients
#[derive(Clone, Debug)]
pub enum EVMTransportClient {
	/// `http://` and `https://` endpoints
	Http(HttpTransportClient),
	/// `ws://` and `wss://` endpoints
	Ws(WsTransportClient),
}

impl EVMTransportClient {
	/// Opens the transport matching the URL scheme
	///
	/// # Arguments
	/// * `url` - Resolved endpoint URL
	/// * `request_timeout` - Per-request timeout for the HTTP client
	///
	/// # Returns
	/// * `Result<Self, TransportError>` - Connected transport or connection error
	pub async fn new(url: &str, request_timeout: Duration) -> Result<Self, TransportError> {
		let scheme = Url::parse(url)
			.map(|parsed| parsed.scheme().to_string())
			.map_err(|e| {
				TransportError::connection(
					"Invalid RPC URL",
					Some(Box::new(e)),
					Some(HashMap::from([("url".to_string(), redact_url(url))])),
				)
			})?;

		match scheme.as_str() {
			"ws" | "wss" => Ok(Self::Ws(WsTransportClient::new(url).await?)),
			"http" | "https" => Ok(Self::Http(
				HttpTransportClient::new(url, request_timeout, &RetryConfig::default()).await?,
			)),
			other => Err(TransportError::connection(
				format!("Unsupported RPC URL scheme '{}'", other),
				None,
				Some(HashMap::from([("url".to_string(), redact_url(url))])),
			)),
		}
	}
}

#[async_trait::async_trait]
impl BlockchainTransport for EVMTransportClient {
	async fn get_current_url(&self) -> String {
		match self {
			Self::Http(client) => client.get_current_url().await,
			Self::Ws(client) => client.get_current_url().await,
		}
	}

	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		match self {
			Self::Http(client) => client.send_raw_request(method, params).await,
			Self::Ws(client) => client.send_raw_request(method, params).await,
		}
	}
}
