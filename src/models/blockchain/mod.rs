//! Blockchain data models.
//!
//! Only EVM-compatible chains are ingested. Blocks and transactions are decoded from the
//! raw JSON-RPC payload into explicit structs whose optional fields mirror what providers
//! are allowed to omit.

pub mod evm;

use serde::{Deserialize, Serialize};

/// How block headers are decoded.
///
/// Chosen once per chain at configuration time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderDecoding {
	/// Reject headers whose `extraData` exceeds 32 bytes
	#[default]
	Standard,
	/// Accept oversized `extraData` and expose it as proof-of-authority data
	ProofOfAuthority,
}

/// Raised when a header cannot be decoded in the configured mode
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HeaderDecodingError {
	#[error(
		"extraData is {len} bytes, exceeding the {max} byte limit of standard headers; \
		 enable proof_of_authority for this chain"
	)]
	OversizedExtraData { len: usize, max: usize },
}
