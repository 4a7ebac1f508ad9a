//! Record extraction error types.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// Represents errors that can occur while normalizing a transaction
#[derive(ThisError, Debug)]
pub enum ExtractionError {
	/// The block payload lacks a field the record needs
	#[error("Missing field: {0}")]
	MissingField(ErrorContext),

	/// A quantity does not fit the record's decimal representation
	#[error("Conversion error: {0}")]
	Conversion(ErrorContext),
}

impl ExtractionError {
	pub fn missing_field(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::MissingField(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn conversion(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Conversion(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for ExtractionError {
	fn trace_id(&self) -> String {
		match self {
			Self::MissingField(ctx) => ctx.trace_id.clone(),
			Self::Conversion(ctx) => ctx.trace_id.clone(),
		}
	}
}
