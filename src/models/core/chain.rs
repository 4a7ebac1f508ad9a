use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::models::{HeaderDecoding, SecretValue};

pub(crate) fn default_poll_interval_ms() -> u64 {
	10_000
}

pub(crate) fn default_reconnect_delay_ms() -> u64 {
	5_000
}

pub(crate) fn default_max_reconnect_delay_ms() -> u64 {
	60_000
}

pub(crate) fn default_connect_max_retries() -> usize {
	5
}

pub(crate) fn default_request_timeout_ms() -> u64 {
	30_000
}

pub(crate) fn default_max_block_retries() -> u32 {
	3
}

pub(crate) fn default_data_dir() -> PathBuf {
	PathBuf::from("data")
}

/// On-disk layout of a chain's transaction log
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreFormat {
	/// A single JSON array rewritten atomically on every append
	#[default]
	JsonArray,
	/// One JSON object per line, appended in place
	JsonLines,
}

/// Configuration for one chain listener.
///
/// One file per chain lives in the chains config directory. Every interval is expressed
/// in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
	/// Label written to every record (e.g. "Ethereum", "BNB Chain")
	pub name: String,

	/// Unique identifier, used for cursor and dead-letter file names
	pub slug: String,

	/// Native asset label written to every record (e.g. "ETH", "BNB")
	pub token_symbol: String,

	/// Provider endpoint, `ws(s)://` or `http(s)://`
	pub rpc_url: SecretValue,

	/// Path of the transaction log
	pub output_path: PathBuf,

	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,

	/// Initial delay before reconnecting; doubles on every consecutive failure
	#[serde(default = "default_reconnect_delay_ms")]
	pub reconnect_delay_ms: u64,

	#[serde(default = "default_max_reconnect_delay_ms")]
	pub max_reconnect_delay_ms: u64,

	/// Connection attempts made by one Connecting phase before the listener gives up
	#[serde(default = "default_connect_max_retries")]
	pub connect_max_retries: usize,

	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,

	/// Consecutive failures tolerated for one block before it is dead-lettered
	#[serde(default = "default_max_block_retries")]
	pub max_block_retries: u32,

	/// Upper bound on the number of blocks processed after an outage
	#[serde(default)]
	pub max_catchup_blocks: Option<u64>,

	/// Accept and expose oversized `extraData` headers (BNB Chain and other PoA chains)
	#[serde(default)]
	pub proof_of_authority: bool,

	#[serde(default)]
	pub store_format: StoreFormat,

	/// Directory holding the cursor and dead-letter files
	#[serde(default = "default_data_dir")]
	pub data_dir: PathBuf,
}

impl ChainConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn reconnect_delay(&self) -> Duration {
		Duration::from_millis(self.reconnect_delay_ms)
	}

	pub fn max_reconnect_delay(&self) -> Duration {
		Duration::from_millis(self.max_reconnect_delay_ms)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}

	/// Header decoding mode selected by `proof_of_authority`
	pub fn header_decoding(&self) -> HeaderDecoding {
		if self.proof_of_authority {
			HeaderDecoding::ProofOfAuthority
		} else {
			HeaderDecoding::Standard
		}
	}

	/// Path of the persisted cursor, `<data_dir>/<slug>_last_block.txt`
	pub fn cursor_path(&self) -> PathBuf {
		self.data_dir.join(format!("{}_last_block.txt", self.slug))
	}

	/// Path of the dead-letter file, `<data_dir>/<slug>_missed_blocks.txt`
	pub fn missed_blocks_path(&self) -> PathBuf {
		self.data_dir.join(format!("{}_missed_blocks.txt", self.slug))
	}
}
