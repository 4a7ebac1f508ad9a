//! Domain models and data structures for transaction ingestion.
//!
//! - `blockchain`: EVM block and transaction models and header decoding modes
//! - `config`: Configuration loading and validation
//! - `core`: Chain configuration and the persisted transaction record
//! - `security`: Secret values

mod blockchain;
mod config;
mod core;
mod security;

pub use blockchain::{HeaderDecoding, HeaderDecodingError};

pub use blockchain::evm::{
	EVMBaseBlock, EVMBaseTransaction, EVMBlock, EVMTransaction, MAX_STANDARD_EXTRA_DATA_LEN,
};

pub use core::{ChainConfig, StoreFormat, TransactionRecord};

pub use config::{ConfigError, ConfigLoader, DEFAULT_CHAINS_DIR};

pub use security::{SecretString, SecretValue, SecurityError};
