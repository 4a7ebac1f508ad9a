use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::time::Duration;

use chain_ingestor::{
	services::blockchain::{BlockchainTransport, HttpTransportClient, TransportError},
	utils::{tests::no_retry_config, JitterSetting, RetryConfig},
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn net_version_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
	server
		.mock("POST", Matcher::Any)
		.match_body(Matcher::PartialJson(json!({"method": "net_version"})))
		.with_header("content-type", "application/json")
		.with_status(200)
		.with_body(r#"{"jsonrpc":"2.0","id":1,"result":"1"}"#)
		.create()
}

#[tokio::test]
async fn test_client_creation_runs_connection_test() {
	let mut server = Server::new_async().await;
	let mock = net_version_mock(&mut server);

	let transport = HttpTransportClient::new(&server.url(), TIMEOUT, &no_retry_config())
		.await
		.unwrap();

	assert_eq!(transport.get_current_url().await, server.url());
	mock.assert();
}

#[tokio::test]
async fn test_current_url_hides_api_key() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/v3/0123456789abcdef")
		.match_query(Matcher::UrlEncoded("apikey".into(), "secret".into()))
		.with_status(200)
		.with_body(r#"{"jsonrpc":"2.0","id":1,"result":"1"}"#)
		.create();

	let url = format!("{}/v3/0123456789abcdef?apikey=secret", server.url());
	let transport = HttpTransportClient::new(&url, TIMEOUT, &no_retry_config())
		.await
		.unwrap();

	let label = transport.get_current_url().await;
	assert_eq!(label, server.url());
	assert!(!label.contains("0123456789abcdef"));
	assert!(!label.contains("secret"));
	mock.assert();
}

#[tokio::test]
async fn test_failed_connection_test_does_not_leak_url() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", Matcher::Any)
		.with_status(500)
		.expect(1)
		.create();

	let url = format!("{}/v3/0123456789abcdef", server.url());
	let err = HttpTransportClient::new(&url, TIMEOUT, &no_retry_config())
		.await
		.unwrap_err();

	assert!(matches!(err, TransportError::Connection(_)));
	assert!(err.to_string().contains("500"));
	assert!(!err.to_string().contains("0123456789abcdef"));
	mock.assert();
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
	let mut server = Server::new_async().await;
	let retry_config = RetryConfig {
		max_retries: 2,
		initial_backoff: Duration::from_millis(1),
		max_backoff: Duration::from_millis(5),
		jitter: JitterSetting::None,
		..RetryConfig::default()
	};
	let mock = server
		.mock("POST", Matcher::Any)
		.with_status(503)
		.expect(1 + retry_config.max_retries as usize)
		.create();

	let result = HttpTransportClient::new(&server.url(), TIMEOUT, &retry_config).await;

	assert!(result.is_err());
	mock.assert();
}

#[tokio::test]
async fn test_invalid_url() {
	let err = HttpTransportClient::new("not a url", TIMEOUT, &no_retry_config())
		.await
		.unwrap_err();
	assert!(matches!(err, TransportError::Connection(_)));
}

#[tokio::test]
async fn test_send_raw_request() {
	let mut server = Server::new_async().await;
	let _handshake = net_version_mock(&mut server);
	let block_number = server
		.mock("POST", Matcher::Any)
		.match_body(Matcher::PartialJson(json!({
			"jsonrpc": "2.0",
			"method": "eth_getBlockByNumber",
			"params": ["0x10", true]
		})))
		.with_status(200)
		.with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
		.create();

	let transport = HttpTransportClient::new(&server.url(), TIMEOUT, &no_retry_config())
		.await
		.unwrap();
	let response = transport
		.send_raw_request("eth_getBlockByNumber", Some(json!(["0x10", true])))
		.await
		.unwrap();

	assert_eq!(response["result"], Value::Null);
	block_number.assert();
}

#[tokio::test]
async fn test_send_raw_request_http_error() {
	let mut server = Server::new_async().await;
	let _handshake = net_version_mock(&mut server);
	let _failing = server
		.mock("POST", Matcher::Any)
		.match_body(Matcher::PartialJson(json!({"method": "eth_blockNumber"})))
		.with_status(429)
		.with_body("slow down")
		.create();

	let transport = HttpTransportClient::new(&server.url(), TIMEOUT, &no_retry_config())
		.await
		.unwrap();
	let err = transport
		.send_raw_request::<Value>("eth_blockNumber", None)
		.await
		.unwrap_err();

	match err {
		TransportError::Http {
			status_code, body, ..
		} => {
			assert_eq!(status_code.as_u16(), 429);
			assert_eq!(body, "slow down");
		}
		other => panic!("expected an HTTP error, got {:?}", other),
	}
}

#[tokio::test]
async fn test_send_raw_request_invalid_json() {
	let mut server = Server::new_async().await;
	let _handshake = net_version_mock(&mut server);
	let _garbled = server
		.mock("POST", Matcher::Any)
		.match_body(Matcher::PartialJson(json!({"method": "eth_blockNumber"})))
		.with_status(200)
		.with_body("{not json")
		.create();

	let transport = HttpTransportClient::new(&server.url(), TIMEOUT, &no_retry_config())
		.await
		.unwrap();
	let err = transport
		.send_raw_request::<Value>("eth_blockNumber", None)
		.await
		.unwrap_err();

	assert!(matches!(err, TransportError::ResponseParse(_)));
}
