//! HTTP transport implementation for blockchain interactions.
//!
//! Sends JSON-RPC requests to a single HTTP(S) endpoint. Transient failures (timeouts,
//! connection resets, 5xx and 429 responses) are retried by the middleware a bounded number
//! of times before the error reaches the caller.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::Value;
use std::{collections::HashMap, time::Duration};
use url::Url;

use crate::{
	services::blockchain::transports::{
		connection_test_request, redact_url, BlockchainTransport, TransientErrorRetryStrategy,
		TransportError,
	},
	utils::http::{create_retryable_http_client, RetryConfig},
};

/// HTTP transport client for JSON-RPC endpoints
///
/// The client is cheap to clone and can be shared across tasks.
#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	/// Retryable HTTP client for making requests
	pub client: ClientWithMiddleware,
	url: Url,
	label: String,
}

impl HttpTransportClient {
	/// Creates a new HTTP transport client and verifies the endpoint answers `net_version`
	///
	/// # Arguments
	/// * `url` - Endpoint URL, possibly carrying an API key
	/// * `request_timeout` - Per-request timeout of the underlying client
	/// * `retry_config` - Retry policy for transient errors
	///
	/// # Returns
	/// * `Result<Self, TransportError>` - New client instance or connection error
	pub async fn new(
		url: &str,
		request_timeout: Duration,
		retry_config: &RetryConfig,
	) -> Result<Self, TransportError> {
		let label = redact_url(url);
		let metadata = Some(HashMap::from([("url".to_string(), label.clone())]));

		let parsed = Url::parse(url).map_err(|e| {
			TransportError::connection("Invalid RPC URL", Some(Box::new(e)), metadata.clone())
		})?;

		let base_http_client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(Duration::from_secs(90))
			.timeout(request_timeout)
			.connect_timeout(request_timeout)
			.build()
			.map_err(|e| {
				TransportError::connection(
					"Failed to create base HTTP client",
					Some(Box::new(e)),
					metadata.clone(),
				)
			})?;

		let client = create_retryable_http_client(
			retry_config,
			base_http_client,
			Some(TransientErrorRetryStrategy),
		);

		let response = client
			.post(parsed.clone())
			.json(&connection_test_request(1))
			.send()
			.await
			.map_err(|e| {
				TransportError::connection(
					format!("Failed to connect to {}", label),
					Some(Box::new(e)),
					metadata.clone(),
				)
			})?;

		if !response.status().is_success() {
			return Err(TransportError::connection(
				format!(
					"Connection test against {} failed with status {}",
					label,
					response.status()
				),
				None,
				metadata,
			));
		}

		tracing::debug!("Connected to HTTP endpoint {}", label);

		Ok(Self {
			client,
			url: parsed,
			label,
		})
	}
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	async fn get_current_url(&self) -> String {
		self.label.clone()
	}

	/// Sends a JSON-RPC request to the endpoint
	///
	/// # Arguments
	/// * `method` - The JSON-RPC method name to call
	/// * `params` - Optional parameters for the method call
	///
	/// # Returns
	/// * `Result<Value, TransportError>` - JSON response or error with context
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		let request_body = self.customize_request(method, params).await;

		let request_body_str = serde_json::to_string(&request_body).map_err(|e| {
			TransportError::request_serialization(
				"Failed to serialize request JSON",
				Some(Box::new(e)),
				None,
			)
		})?;

		let response = self
			.client
			.post(self.url.clone())
			.header("Content-Type", "application/json")
			.body(request_body_str)
			.send()
			.await
			.map_err(|e| {
				TransportError::network(
					format!("Request {} to {} failed", method, self.label),
					Some(Box::new(e)),
					None,
				)
			})?;

		let status = response.status();
		if !status.is_success() {
			let error_body = response.text().await.unwrap_or_default();
			return Err(TransportError::http(
				status,
				self.label.clone(),
				error_body,
				None,
				None,
			));
		}

		response.json().await.map_err(|e| {
			TransportError::response_parse(
				"Failed to parse JSON response".to_string(),
				Some(Box::new(e)),
				None,
			)
		})
	}
}
