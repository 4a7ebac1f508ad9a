//! Dual-chain transaction ingestion service.
//!
//! This library listens to EVM-compatible chains and appends every new transaction to a
//! durable, ordered per-chain log. It includes:
//!
//! - Configuration management through JSON files
//! - Chain clients over WebSocket and HTTP JSON-RPC
//! - A per-chain listener state machine with persisted cursors and dead-lettering
//! - Crash-safe transaction stores
//!
//! # Module Structure
//!
//! - `bootstrap`: Loads configuration and runs the listeners
//! - `models`: Data structures for configuration, blockchain data and records
//! - `repositories`: Configuration storage and management
//! - `services`: Chain clients, extraction, storage, listeners and supervision
//! - `utils`: Common utilities and helper functions

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
