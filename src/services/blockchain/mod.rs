//! Blockchain client interfaces and implementations.
//!
//! Provides abstractions and concrete implementations for reading blocks from
//! EVM-compatible networks. Includes:
//!
//! - Generic blockchain client trait
//! - EVM client with header decoding
//! - Connectors that open clients from chain configuration
//! - Network transport implementations (HTTP and WebSocket)
//! - Error handling for blockchain operations

mod client;
mod clients;
mod connector;
mod error;
mod transports;

pub use client::BlockChainClient;
pub use clients::EvmClient;
pub use connector::{ChainConnector, EvmConnector};
pub use error::BlockChainError;
pub use transports::{
	redact_url, BlockchainTransport, EVMTransportClient, HttpTransportClient,
	TransientErrorRetryStrategy, TransportError, WsTransportClient, CONNECTION_TEST_METHOD,
};
