//! Secret values.
//!
//! Provider endpoint URLs usually embed an API key, so `rpc_url` is configured as a
//! [`SecretValue`]: either the URL itself or the name of an environment variable holding it.
//! Values are zeroized when dropped and never printed.

use serde::{Deserialize, Serialize};
use std::{env, fmt};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::models::security::error::{SecurityError, SecurityResult};

/// A secret that is either given inline or read from the environment.
///
/// Serialized as `{"type": "plain", "value": "..."}` or
/// `{"type": "environment", "value": "ETH_WS_URL"}`.
#[derive(Debug, Clone, Serialize, Deserialize, ZeroizeOnDrop)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
#[serde(deny_unknown_fields)]
pub enum SecretValue {
	/// A plain text secret value
	#[serde(alias = "Plain")]
	Plain(SecretString),
	/// A secret stored in an environment variable
	#[serde(alias = "Environment")]
	Environment(String),
}

impl PartialEq for SecretValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Plain(l0), Self::Plain(r0)) => l0.as_str() == r0.as_str(),
			(Self::Environment(l0), Self::Environment(r0)) => l0 == r0,
			_ => false,
		}
	}
}

/// A string type that automatically zeroizes its contents when dropped.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SecretString(***)")
	}
}

impl SecretValue {
	/// Resolves the secret to its value.
	///
	/// # Errors
	///
	/// Returns a `SecurityError` when the referenced environment variable is not set, or
	/// when the resolved value is empty.
	pub fn resolve(&self) -> SecurityResult<SecretString> {
		let resolved = match self {
			SecretValue::Plain(secret) => secret.clone(),
			SecretValue::Environment(env_var) => {
				env::var(env_var).map(SecretString::new).map_err(|e| {
					Box::new(SecurityError::parse_error(
						format!("Failed to get environment variable {}", env_var),
						Some(e.into()),
						None,
					))
				})?
			}
		};

		if resolved.as_str().trim().is_empty() {
			return Err(Box::new(SecurityError::validation_error(
				"Secret resolved to an empty value",
				None,
				None,
			)));
		}
		Ok(resolved)
	}

	/// Checks if the secret value is empty
	pub fn is_empty(&self) -> bool {
		self.as_str().trim().is_empty()
	}

	/// Returns the inline secret or the environment variable name
	pub fn as_str(&self) -> &str {
		match self {
			SecretValue::Plain(secret) => secret.as_str(),
			SecretValue::Environment(env_var) => env_var,
		}
	}
}

impl Zeroize for SecretValue {
	fn zeroize(&mut self) {
		match self {
			SecretValue::Plain(secret) => secret.zeroize(),
			SecretValue::Environment(env_var) => env_var.clear(),
		}
	}
}

impl SecretString {
	/// Creates a new `SecretString` with the given value.
	pub fn new(value: String) -> Self {
		Self(value)
	}

	/// Gets a reference to the underlying string.
	///
	/// The reference should be used immediately and not stored.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl AsRef<str> for SecretString {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}

impl fmt::Display for SecretValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SecretValue::Plain(_) => write!(f, "***"),
			SecretValue::Environment(env_var) => write!(f, "${}", env_var),
		}
	}
}
