//! Chain configuration repository implementation.
//!
//! Loads one [`ChainConfig`] per JSON file and keeps them keyed by file stem, in file name
//! order, so the supervisor starts listeners in a stable order.

#![allow(clippy::result_large_err)]

use std::{
	collections::{BTreeMap, HashMap},
	path::Path,
};

use async_trait::async_trait;

use crate::{
	models::{ChainConfig, ConfigLoader},
	repositories::error::RepositoryError,
};

/// Repository for storing and retrieving chain configurations
#[derive(Clone)]
pub struct ChainRepository {
	/// Map of file stems to chain configurations
	pub chains: BTreeMap<String, ChainConfig>,
}

impl ChainRepository {
	/// Create a new chain repository from the given path
	///
	/// Loads all chain configurations from JSON files in the specified directory
	/// (or `config/chains` if None is provided). At least one chain is required.
	pub async fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		let chains = Self::load_all(path).await?;
		if chains.is_empty() {
			return Err(RepositoryError::validation_error(
				"No chain configurations found",
				None,
				Some(HashMap::from([(
					"path".to_string(),
					path.map_or_else(|| "default".to_string(), |p| p.display().to_string()),
				)])),
			));
		}
		Ok(ChainRepository { chains })
	}
}

/// Interface for chain repository implementations
#[async_trait]
pub trait ChainRepositoryTrait: Clone {
	/// Create a new repository instance
	async fn new(path: Option<&Path>) -> Result<Self, RepositoryError>
	where
		Self: Sized;

	/// Load all chain configurations from the given path
	async fn load_all(
		path: Option<&Path>,
	) -> Result<BTreeMap<String, ChainConfig>, RepositoryError>;

	/// Get a specific chain by slug
	fn get(&self, slug: &str) -> Option<ChainConfig>;

	/// Get all chains, in file name order
	fn get_all(&self) -> Vec<ChainConfig>;
}

#[async_trait]
impl ChainRepositoryTrait for ChainRepository {
	async fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		ChainRepository::new(path).await
	}

	async fn load_all(
		path: Option<&Path>,
	) -> Result<BTreeMap<String, ChainConfig>, RepositoryError> {
		ChainConfig::load_all(path).await.map_err(|e| {
			RepositoryError::load_error(
				"Failed to load chains",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"path".to_string(),
					path.map_or_else(|| "default".to_string(), |p| p.display().to_string()),
				)])),
			)
		})
	}

	fn get(&self, slug: &str) -> Option<ChainConfig> {
		self.chains.values().find(|chain| chain.slug == slug).cloned()
	}

	fn get_all(&self) -> Vec<ChainConfig> {
		self.chains.values().cloned().collect()
	}
}

/// Service layer for chain repository operations
#[derive(Clone)]
pub struct ChainService<T: ChainRepositoryTrait> {
	repository: T,
}

impl<T: ChainRepositoryTrait> ChainService<T> {
	/// Create a new chain service with the default repository implementation
	pub async fn new(path: Option<&Path>) -> Result<ChainService<ChainRepository>, RepositoryError> {
		let repository = ChainRepository::new(path).await?;
		Ok(ChainService { repository })
	}

	/// Create a new chain service with a custom repository implementation
	pub fn new_with_repository(repository: T) -> Result<Self, RepositoryError> {
		Ok(ChainService { repository })
	}

	/// Get a specific chain by slug
	pub fn get(&self, slug: &str) -> Option<ChainConfig> {
		self.repository.get(slug)
	}

	/// Get all chains
	pub fn get_all(&self) -> Vec<ChainConfig> {
		self.repository.get_all()
	}
}
