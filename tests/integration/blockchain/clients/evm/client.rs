use mockall::predicate;
use serde_json::{json, Value};

use chain_ingestor::{
	models::HeaderDecoding,
	services::blockchain::{BlockChainClient, BlockChainError, EvmClient, TransportError},
};

use crate::integration::mocks::MockEVMTransportClient;

fn rpc_result(result: Value) -> Value {
	json!({"jsonrpc": "2.0", "id": 1, "result": result})
}

fn raw_block(number: u64, extra_data: &str) -> Value {
	json!({
		"hash": "0x88e96d4537bea4d9c05d12549907b32561d3bf31f45aae734cdc119f13406cb6",
		"parentHash": "0xd4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3",
		"number": format!("0x{:x}", number),
		"timestamp": "0x6632301a",
		"miner": "0x05a56e2d52c817161883f50c441c3228cfe54d9f",
		"gasUsed": "0xa410",
		"gasLimit": "0x1c9c380",
		"extraData": extra_data,
		"transactions": [
			{
				"hash": "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060",
				"from": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
				"to": "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359",
				"value": "0xde0b6b3a7640000",
				"gas": "0x5208",
				"gasPrice": "0x3b9aca00",
				"input": "0x",
				"nonce": "0x1",
				"transactionIndex": "0x0"
			},
			{
				"hash": "0x2a7f3b4f1f0d7f7c5d2f4e0f1c9b0d8a6e3c7b2a1f0e9d8c7b6a5f4e3d2c1b0a",
				"from": "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359",
				"to": null,
				"value": "0x0",
				"gas": "0x5208",
				"input": "0x6080604052",
				"nonce": "0x2",
				"transactionIndex": "0x1",
				"type": "0x2",
				"maxFeePerGas": "0x77359400",
				"maxPriorityFeePerGas": "0x3b9aca00",
				"chainId": "0x1"
			}
		]
	})
}

fn client_returning(response: Value) -> EvmClient<MockEVMTransportClient> {
	let mut mock = MockEVMTransportClient::new();
	mock.expect_send_raw_request()
		.times(1)
		.returning(move |_, _| Ok(response.clone()));
	EvmClient::new_with_transport(mock, HeaderDecoding::Standard)
}

#[tokio::test]
async fn test_get_latest_block_number() {
	let mut mock = MockEVMTransportClient::new();
	mock.expect_send_raw_request()
		.with(predicate::eq("eth_blockNumber"), predicate::eq(None))
		.times(1)
		.returning(|_, _| Ok(rpc_result(json!("0x1234"))));

	let client = EvmClient::new_with_transport(mock, HeaderDecoding::Standard);
	assert_eq!(client.get_latest_block_number().await.unwrap(), 0x1234);
}

#[tokio::test]
async fn test_get_latest_block_number_invalid_hex() {
	let client = client_returning(rpc_result(json!("not-hex")));
	let err = client.get_latest_block_number().await.unwrap_err();
	assert!(matches!(err, BlockChainError::RequestError(_)));
}

#[tokio::test]
async fn test_get_latest_block_number_rpc_error() {
	let client = client_returning(json!({
		"jsonrpc": "2.0",
		"id": 1,
		"error": {"code": -32005, "message": "rate limit exceeded"}
	}));
	let err = client.get_latest_block_number().await.unwrap_err();
	assert!(matches!(err, BlockChainError::RequestError(_)));
	assert!(err.to_string().contains("rate limit exceeded"));
}

#[tokio::test]
async fn test_get_latest_block_number_transport_error() {
	let mut mock = MockEVMTransportClient::new();
	mock.expect_send_raw_request()
		.times(1)
		.returning(|_, _| Err(TransportError::network("connection reset", None, None)));

	let client = EvmClient::new_with_transport(mock, HeaderDecoding::Standard);
	let err = client.get_latest_block_number().await.unwrap_err();
	assert!(matches!(err, BlockChainError::RequestError(_)));
	assert!(!err.is_block_specific());
}

#[tokio::test]
async fn test_get_block_with_transactions() {
	let mut mock = MockEVMTransportClient::new();
	mock.expect_send_raw_request()
		.with(
			predicate::eq("eth_getBlockByNumber"),
			predicate::function(|params: &Option<Vec<Value>>| {
				params.as_deref() == Some(&[json!("0x10"), json!(true)][..])
			}),
		)
		.times(1)
		.returning(|_, _| Ok(rpc_result(raw_block(16, "0x"))));

	let client = EvmClient::new_with_transport(mock, HeaderDecoding::Standard);
	let block = client.get_block_with_transactions(16).await.unwrap();

	assert_eq!(block.number(), Some(16));
	assert_eq!(block.timestamp(), 0x6632301a);
	assert_eq!(block.transactions.len(), 2);
	assert!(block.transactions[1].to().is_none());
	assert!(block.transactions[1].has_input());
	assert!(block.proof_of_authority_data.is_none());
}

#[tokio::test]
async fn test_missing_block_is_block_not_found() {
	let client = client_returning(rpc_result(Value::Null));
	let err = client.get_block_with_transactions(99).await.unwrap_err();
	assert!(matches!(err, BlockChainError::BlockNotFound(_)));
	assert!(err.is_block_specific());
}

#[tokio::test]
async fn test_malformed_block_is_decode_error() {
	let client = client_returning(rpc_result(json!({"number": "0x10", "transactions": "nope"})));
	let err = client.get_block_with_transactions(16).await.unwrap_err();
	assert!(matches!(err, BlockChainError::DecodeError(_)));
	assert!(err.is_block_specific());
}

#[tokio::test]
async fn test_block_rpc_error_is_request_error() {
	let client = client_returning(json!({
		"jsonrpc": "2.0",
		"id": 1,
		"error": {"code": -32000, "message": "header not found"}
	}));
	let err = client.get_block_with_transactions(16).await.unwrap_err();
	assert!(matches!(err, BlockChainError::RequestError(_)));
}

#[tokio::test]
async fn test_oversized_extra_data_rejected_in_standard_mode() {
	let extra = format!("0x{}", "ab".repeat(97));
	let client = client_returning(rpc_result(raw_block(16, &extra)));
	assert_eq!(client.header_decoding(), HeaderDecoding::Standard);

	let err = client.get_block_with_transactions(16).await.unwrap_err();
	assert!(matches!(err, BlockChainError::DecodeError(_)));
}

#[tokio::test]
async fn test_oversized_extra_data_accepted_in_proof_of_authority_mode() {
	let extra = format!("0x{}", "ab".repeat(97));
	let response = rpc_result(raw_block(16, &extra));
	let mut mock = MockEVMTransportClient::new();
	mock.expect_send_raw_request()
		.times(1)
		.returning(move |_, _| Ok(response.clone()));

	let client = EvmClient::new_with_transport(mock, HeaderDecoding::ProofOfAuthority);
	let block = client.get_block_with_transactions(16).await.unwrap();

	assert_eq!(block.proof_of_authority_data.as_ref().map(|d| d.len()), Some(97));
	assert_eq!(block.transactions.len(), 2);
}
