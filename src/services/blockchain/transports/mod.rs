//! Network transport implementations for blockchain clients.
//!
//! - `http`: JSON-RPC over HTTP(S) with transient-error retries
//! - `ws`: JSON-RPC over a persistent WebSocket connection
//! - `evm`: the transport actually used by EVM clients, chosen from the endpoint scheme

mod error;
mod evm;
mod http;
mod ws;

pub use error::TransportError;
pub use evm::EVMTransportClient;
pub use http::HttpTransportClient;
pub use ws::WsTransportClient;

use reqwest_retry::{
	default_on_request_failure, default_on_request_success, Retryable, RetryableStrategy,
};
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

/// JSON-RPC request used to verify a freshly opened connection
pub const CONNECTION_TEST_METHOD: &str = "net_version";

/// Base trait for all blockchain transport clients
#[async_trait::async_trait]
pub trait BlockchainTransport: Send + Sync {
	/// Get the endpoint in use, without path or query (which may carry an API key)
	async fn get_current_url(&self) -> String;

	/// Send a raw request to the blockchain
	///
	/// Returns the whole JSON-RPC response object; callers read `result` or `error`.
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize;

	/// Customizes the request for specific blockchain requirements
	async fn customize_request<P>(&self, method: &str, params: Option<P>) -> Value
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		// Default implementation for JSON-RPC
		json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params.map(|p| p.into())
		})
	}
}

/// A default retry strategy that retries on requests based on the status code
/// This can be used to customise the retry strategy
pub struct TransientErrorRetryStrategy;
impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(success) => default_on_request_success(success),
			Err(error) => default_on_request_failure(error),
		}
	}
}

/// Reduces an endpoint URL to `scheme://host[:port]` so it can be logged
pub fn redact_url(url: &str) -> String {
	match Url::parse(url) {
		Ok(parsed) => {
			let host = parsed.host_str().unwrap_or_default();
			match parsed.port() {
				Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
				None => format!("{}://{}", parsed.scheme(), host),
			}
		}
		Err(_) => "<invalid url>".to_string(),
	}
}

/// The JSON-RPC request sent to verify a new connection
pub(crate) fn connection_test_request(id: u64) -> Value {
	json!({
		"jsonrpc": "2.0",
		"id": id,
		"method": CONNECTION_TEST_METHOD,
		"params": []
	})
}
