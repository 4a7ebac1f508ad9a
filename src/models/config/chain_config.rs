//! Chain configuration loading and validation.
//!
//! Implements [`ConfigLoader`] for [`ChainConfig`], reading one JSON file per chain.

use async_trait::async_trait;
use std::{collections::HashMap, path::Path};
use url::Url;

use crate::{
	models::{config::error::ConfigError, ChainConfig, ConfigLoader, SecretValue},
	utils::normalize_string,
};

/// Directory searched when no config directory is given
pub const DEFAULT_CHAINS_DIR: &str = "config/chains";

const SUPPORTED_SCHEMES: [&str; 4] = ["ws", "wss", "http", "https"];

fn path_metadata(path: &Path) -> Option<HashMap<String, String>> {
	Some(HashMap::from([(
		"path".to_string(),
		path.display().to_string(),
	)]))
}

impl ChainConfig {
	/// Scheme and host of the endpoint, safe to log (API keys live in the path or query)
	pub fn endpoint_label(&self) -> String {
		match Url::parse(self.rpc_url.as_str()) {
			Ok(url) => format!("{}://{}", url.scheme(), url.host_str().unwrap_or("")),
			Err(_) => self.rpc_url.to_string(),
		}
	}
}

#[async_trait]
impl ConfigLoader for ChainConfig {
	/// Resolve the endpoint secret, replacing it with its plain value
	async fn resolve_secrets(&self) -> Result<Self, ConfigError> {
		dotenvy::dotenv().ok();
		let mut chain = self.clone();

		let resolved_url = chain.rpc_url.resolve().map_err(|e| {
			ConfigError::parse_error(
				format!("failed to resolve RPC URL: {}", e),
				Some(e as Box<dyn std::error::Error + Send + Sync>),
				Some(HashMap::from([("chain".to_string(), chain.slug.clone())])),
			)
		})?;
		chain.rpc_url = SecretValue::Plain(resolved_url);
		Ok(chain)
	}

	/// Load all chain configurations from a directory
	///
	/// Every `.json` file in the directory is parsed, resolved and validated; the map key is
	/// the file stem.
	async fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>,
	{
		let chains_dir = path.unwrap_or(Path::new(DEFAULT_CHAINS_DIR));
		let mut pairs = Vec::new();

		if !chains_dir.exists() {
			return Err(ConfigError::file_error(
				"chains directory not found",
				None,
				path_metadata(chains_dir),
			));
		}

		let mut paths = Vec::new();
		for entry in std::fs::read_dir(chains_dir).map_err(|e| {
			ConfigError::file_error(
				format!("failed to read chains directory: {}", e),
				Some(Box::new(e)),
				path_metadata(chains_dir),
			)
		})? {
			let entry = entry.map_err(|e| {
				ConfigError::file_error(
					format!("failed to read directory entry: {}", e),
					Some(Box::new(e)),
					path_metadata(chains_dir),
				)
			})?;
			let path = entry.path();
			if Self::is_json_file(&path) {
				paths.push(path);
			}
		}
		// Directory order is platform dependent
		paths.sort();

		for path in paths {
			let name = path
				.file_stem()
				.and_then(|s| s.to_str())
				.unwrap_or("unknown")
				.to_string();

			let chain = Self::load_from_path(&path).await?;

			let existing: Vec<&ChainConfig> = pairs.iter().map(|(_, chain)| chain).collect();
			Self::validate_uniqueness(&existing, &chain, &path.display().to_string())?;

			pairs.push((name, chain));
		}

		Ok(T::from_iter(pairs))
	}

	/// Load a chain configuration from a specific file
	async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let file = std::fs::File::open(path).map_err(|e| {
			ConfigError::file_error(
				format!("failed to open chain config file: {}", e),
				Some(Box::new(e)),
				path_metadata(path),
			)
		})?;
		let config: ChainConfig = serde_json::from_reader(file).map_err(|e| {
			ConfigError::parse_error(
				format!("failed to parse chain config: {}", e),
				Some(Box::new(e)),
				path_metadata(path),
			)
		})?;

		let config = config.resolve_secrets().await?;
		config.validate()?;

		Ok(config)
	}

	/// Validate the chain configuration
	///
	/// Ensures that:
	/// - name, slug and token symbol are set, and the slug is file-name safe
	/// - the endpoint is a ws, wss, http or https URL
	/// - intervals, timeouts and retry budgets are non-zero
	fn validate(&self) -> Result<(), ConfigError> {
		if self.name.trim().is_empty() {
			return Err(ConfigError::validation_error(
				"Chain name is required",
				None,
				None,
			));
		}

		if self.slug.is_empty()
			|| !self
				.slug
				.chars()
				.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
		{
			return Err(ConfigError::validation_error(
				"Slug must contain only lowercase letters, numbers, and underscores",
				None,
				None,
			));
		}

		if self.token_symbol.trim().is_empty() {
			return Err(ConfigError::validation_error(
				"Token symbol is required",
				None,
				None,
			));
		}

		if self.rpc_url.is_empty() {
			return Err(ConfigError::validation_error(
				"RPC URL is required",
				None,
				None,
			));
		}

		// Environment references are checked once resolved
		if let SecretValue::Plain(url) = &self.rpc_url {
			let parsed = Url::parse(url.as_str()).map_err(|e| {
				ConfigError::validation_error(
					format!("Invalid RPC URL: {}", e),
					Some(Box::new(e)),
					None,
				)
			})?;
			if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
				return Err(ConfigError::validation_error(
					format!(
						"RPC URL scheme must be one of: {}",
						SUPPORTED_SCHEMES.join(", ")
					),
					None,
					None,
				));
			}
		}

		if self.output_path.as_os_str().is_empty() {
			return Err(ConfigError::validation_error(
				"Output path is required",
				None,
				None,
			));
		}

		let non_zero = [
			("poll_interval_ms", self.poll_interval_ms),
			("reconnect_delay_ms", self.reconnect_delay_ms),
			("max_reconnect_delay_ms", self.max_reconnect_delay_ms),
			("request_timeout_ms", self.request_timeout_ms),
			("connect_max_retries", self.connect_max_retries as u64),
			("max_block_retries", self.max_block_retries as u64),
		];
		for (field, value) in non_zero {
			if value == 0 {
				return Err(ConfigError::validation_error(
					format!("{} must be greater than 0", field),
					None,
					None,
				));
			}
		}

		if self.max_reconnect_delay_ms < self.reconnect_delay_ms {
			return Err(ConfigError::validation_error(
				"max_reconnect_delay_ms must not be lower than reconnect_delay_ms",
				None,
				None,
			));
		}

		if self.max_catchup_blocks == Some(0) {
			return Err(ConfigError::validation_error(
				"max_catchup_blocks must be greater than 0",
				None,
				None,
			));
		}

		self.validate_protocol();

		Ok(())
	}

	/// Logs a warning when the endpoint does not use TLS
	fn validate_protocol(&self) {
		let url = self.rpc_url.as_str();
		if url.starts_with("http://") {
			tracing::warn!(
				"Chain '{}' uses an insecure RPC URL: {}",
				self.slug,
				self.endpoint_label()
			);
		}
		if url.starts_with("ws://") {
			tracing::warn!(
				"Chain '{}' uses an insecure WebSocket URL: {}",
				self.slug,
				self.endpoint_label()
			);
		}
	}

	fn validate_uniqueness(
		instances: &[&Self],
		current_instance: &Self,
		file_path: &str,
	) -> Result<(), ConfigError> {
		let fields = [
			("name", current_instance.name.clone()),
			("slug", current_instance.slug.clone()),
			(
				"output_path",
				current_instance.output_path.display().to_string(),
			),
		];

		for (field_name, field_value) in fields {
			if instances.iter().any(|existing| {
				let existing_value = match field_name {
					"name" => existing.name.clone(),
					"slug" => existing.slug.clone(),
					_ => existing.output_path.display().to_string(),
				};
				normalize_string(&existing_value) == normalize_string(&field_value)
			}) {
				return Err(ConfigError::validation_error(
					format!("Duplicate chain {} found: '{}'", field_name, field_value),
					None,
					Some(HashMap::from([
						(format!("chain_{}", field_name), field_value.to_string()),
						("path".to_string(), file_path.to_string()),
					])),
				));
			}
		}
		Ok(())
	}
}
