//! Store error types and handling.
//!
//! `Corruption` is soft for the JSON array store: unreadable content is replaced by an empty
//! collection and the error is only logged. `Io` and `Serialization` are hard errors and
//! leave the file untouched.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// Represents errors that can occur while reading or writing a transaction log
#[derive(ThisError, Debug)]
pub enum StoreError {
	/// Stored content is not a valid sequence of records
	#[error("Store corruption: {0}")]
	Corruption(ErrorContext),

	/// Filesystem or locking failure
	#[error("Store I/O error: {0}")]
	Io(ErrorContext),

	/// A record could not be encoded
	#[error("Store serialization error: {0}")]
	Serialization(ErrorContext),
}

impl StoreError {
	/// Corruption is reported as a warning by the caller, so it is not logged here
	pub fn corruption(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Corruption(ErrorContext::new(msg, source, metadata))
	}

	pub fn io(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Io(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn serialization(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Serialization(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for StoreError {
	fn trace_id(&self) -> String {
		match self {
			Self::Corruption(ctx) => ctx.trace_id.clone(),
			Self::Io(ctx) => ctx.trace_id.clone(),
			Self::Serialization(ctx) => ctx.trace_id.clone(),
		}
	}
}
