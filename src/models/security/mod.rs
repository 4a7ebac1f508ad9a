//! Security models
//!
//! - `error`: Error types for security operations
//! - `secret`: Secret values (endpoint URLs carrying API keys) with zeroization

mod error;
mod secret;

use std::env;

pub use error::{SecurityError, SecurityResult};
pub use secret::{SecretString, SecretValue};

/// Reads an environment variable, mapping a missing variable to a `SecurityError`.
pub fn get_env_var(key: &str) -> SecurityResult<String> {
	env::var(key).map_err(|e| {
		Box::new(SecurityError::parse_error(
			format!("Missing {} environment variable", key),
			Some(e.into()),
			None,
		))
	})
}
