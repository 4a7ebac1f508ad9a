//! Core services implementing the ingestion pipeline.
//!
//! This module contains the main service implementations:
//! - `blockchain`: Chain client interfaces, connectors and transports
//! - `extractor`: Block and transaction normalization into records
//! - `store`: Durable transaction logs
//! - `listener`: Per-chain polling state machine
//! - `supervisor`: Runs one listener per configured chain

pub mod blockchain;
pub mod extractor;
pub mod listener;
pub mod store;
pub mod supervisor;
