//! Core domain models for the ingestor.
//!
//! - `chain`: Per-chain listener configuration
//! - `record`: The normalized transaction record persisted by the stores

mod chain;
mod record;

pub use chain::{ChainConfig, StoreFormat};
pub use record::TransactionRecord;
