//! WebSocket transport implementation for blockchain interactions.
//!
//! Keeps one persistent connection per client. Requests are serialized over the socket
//! with a mutex and matched to their response by JSON-RPC id; frames for other ids (late
//! answers to abandoned requests, subscription notifications) are skipped. No retry logic
//! lives here: a broken socket surfaces as a `TransportError` and the listener reconnects.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::{
	collections::HashMap,
	fmt,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};
use tokio::{net::TcpStream, sync::Mutex};
use tokio_tungstenite::{
	connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

use crate::services::blockchain::transports::{
	connection_test_request, redact_url, BlockchainTransport, TransportError,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport client for JSON-RPC endpoints
#[derive(Clone)]
pub struct WsTransportClient {
	stream: Arc<Mutex<WsStream>>,
	next_id: Arc<AtomicU64>,
	label: String,
}

impl fmt::Debug for WsTransportClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WsTransportClient")
			.field("url", &self.label)
			.finish()
	}
}

impl WsTransportClient {
	/// Opens the WebSocket and verifies the endpoint answers `net_version`
	///
	/// # Arguments
	/// * `url` - `ws://` or `wss://` endpoint, possibly carrying an API key
	///
	/// # Returns
	/// * `Result<Self, TransportError>` - Connected client or connection error
	pub async fn new(url: &str) -> Result<Self, TransportError> {
		let label = redact_url(url);
		let metadata = Some(HashMap::from([("url".to_string(), label.clone())]));

		let (stream, _response) = connect_async(url).await.map_err(|e| {
			TransportError::connection(
				format!("WebSocket handshake with {} failed", label),
				Some(Box::new(e)),
				metadata.clone(),
			)
		})?;

		let client = Self {
			stream: Arc::new(Mutex::new(stream)),
			next_id: Arc::new(AtomicU64::new(1)),
			label,
		};

		let id = client.next_request_id();
		let response = client
			.exchange(id, connection_test_request(id))
			.await
			.map_err(|e| {
				TransportError::connection(
					format!("Connection test against {} failed", client.label),
					Some(Box::new(e)),
					metadata.clone(),
				)
			})?;
		if let Some(error) = response.get("error") {
			return Err(TransportError::connection(
				format!("Connection test rejected by {}: {}", client.label, error),
				None,
				metadata,
			));
		}

		tracing::debug!("Connected to WebSocket endpoint {}", client.label);
		Ok(client)
	}

	fn next_request_id(&self) -> u64 {
		self.next_id.fetch_add(1, Ordering::Relaxed)
	}

	/// Sends one request and reads frames until the response with the same id arrives
	async fn exchange(&self, id: u64, request: Value) -> Result<Value, TransportError> {
		let body = serde_json::to_string(&request).map_err(|e| {
			TransportError::request_serialization(
				"Failed to serialize request JSON",
				Some(Box::new(e)),
				None,
			)
		})?;

		let mut stream = self.stream.lock().await;
		stream.send(Message::Text(body)).await.map_err(|e| {
			TransportError::network(
				format!("Failed to send request to {}", self.label),
				Some(Box::new(e)),
				None,
			)
		})?;

		loop {
			let frame = match stream.next().await {
				Some(Ok(frame)) => frame,
				Some(Err(e)) => {
					return Err(TransportError::network(
						format!("Failed to read from {}", self.label),
						Some(Box::new(e)),
						None,
					))
				}
				None => {
					return Err(TransportError::network(
						format!("Connection to {} closed", self.label),
						None,
						None,
					))
				}
			};

			let payload = match frame {
				Message::Text(text) => text.into_bytes(),
				Message::Binary(bytes) => bytes,
				Message::Close(_) => {
					return Err(TransportError::network(
						format!("Connection to {} closed by peer", self.label),
						None,
						None,
					))
				}
				// Pings are answered by tungstenite on the next write
				_ => continue,
			};

			let value: Value = serde_json::from_slice(&payload).map_err(|e| {
				TransportError::response_parse(
					"Failed to parse JSON response",
					Some(Box::new(e)),
					None,
				)
			})?;

			if value.get("id").and_then(Value::as_u64) == Some(id) {
				return Ok(value);
			}
			tracing::trace!("Skipping WebSocket frame not matching request id {}", id);
		}
	}
}

#[async_trait]
impl BlockchainTransport for WsTransportClient {
	async fn get_current_url(&self) -> String {
		self.label.clone()
	}

	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		let request = self.customize_request(method, params).await;
		let id = request
			.get("id")
			.and_then(Value::as_u64)
			.unwrap_or_default();
		self.exchange(id, request).await
	}

	/// Assigns a fresh id to every request so responses can be matched
	async fn customize_request<P>(&self, method: &str, params: Option<P>) -> Value
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		json!({
			"jsonrpc": "2.0",
			"id": self.next_request_id(),
			"method": method,
			"params": params.map(|p| p.into()).unwrap_or_else(|| json!([]))
		})
	}
}
