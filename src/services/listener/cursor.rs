//! Listener cursor and dead-letter storage.
//!
//! The cursor is the last block a listener fully processed. It is kept in
//! `<data_dir>/<slug>_last_block.txt` and replaced atomically after every block. Blocks
//! given up on are appended to `<data_dir>/<slug>_missed_blocks.txt`, one number per line.
//! Nothing re-ingests them automatically; the file is for operators, and a resuming
//! listener reports how many blocks it lists.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use crate::{models::ChainConfig, services::store::sync_parent_dir};

/// Interface for cursor storage implementations
#[async_trait]
pub trait CursorStorage: Send + Sync {
	/// Retrieves the last processed block number
	///
	/// # Returns
	/// * `Result<Option<u64>, anyhow::Error>` - Last processed block number or None if not found
	async fn get_last_processed_block(&self) -> Result<Option<u64>, anyhow::Error>;

	/// Saves the last processed block number
	///
	/// # Arguments
	/// * `block` - Block number to save
	async fn save_last_processed_block(&self, block: u64) -> Result<(), anyhow::Error>;

	/// Records a block that was skipped
	///
	/// # Arguments
	/// * `block` - Block number to save
	async fn save_missed_block(&self, block: u64) -> Result<(), anyhow::Error>;

	/// Lists recorded missed blocks in the order they were recorded
	async fn get_missed_blocks(&self) -> Result<Vec<u64>, anyhow::Error>;
}

/// File-based cursor storage for one chain
#[derive(Clone, Debug)]
pub struct FileCursorStorage {
	cursor_path: PathBuf,
	missed_blocks_path: PathBuf,
}

impl FileCursorStorage {
	pub fn new(cursor_path: PathBuf, missed_blocks_path: PathBuf) -> Self {
		Self {
			cursor_path,
			missed_blocks_path,
		}
	}

	/// Storage at the chain's configured cursor and dead-letter paths
	pub fn for_chain(chain: &ChainConfig) -> Self {
		Self::new(chain.cursor_path(), chain.missed_blocks_path())
	}

	async fn ensure_parent(path: &std::path::Path) -> Result<(), anyhow::Error> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent)
				.await
				.map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;
		}
		Ok(())
	}
}

#[async_trait]
impl CursorStorage for FileCursorStorage {
	async fn get_last_processed_block(&self) -> Result<Option<u64>, anyhow::Error> {
		if !self.cursor_path.exists() {
			return Ok(None);
		}

		let content = tokio::fs::read_to_string(&self.cursor_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to read last processed block: {}", e))?;
		let block_number = content
			.trim()
			.parse::<u64>()
			.map_err(|e| anyhow::anyhow!("Failed to parse last processed block: {}", e))?;
		Ok(Some(block_number))
	}

	/// Replaces the cursor file through a synced temporary file and a directory sync, so a
	/// crash leaves either the old or the new cursor on disk
	async fn save_last_processed_block(&self, block: u64) -> Result<(), anyhow::Error> {
		Self::ensure_parent(&self.cursor_path).await?;
		let tmp_path = self.cursor_path.with_extension("txt.tmp");

		let mut file = tokio::fs::File::create(&tmp_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to save last processed block: {}", e))?;
		file.write_all(block.to_string().as_bytes())
			.await
			.map_err(|e| anyhow::anyhow!("Failed to save last processed block: {}", e))?;
		file.sync_all()
			.await
			.map_err(|e| anyhow::anyhow!("Failed to sync last processed block: {}", e))?;
		drop(file);

		tokio::fs::rename(&tmp_path, &self.cursor_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to save last processed block: {}", e))?;

		let cursor_path = self.cursor_path.clone();
		tokio::task::spawn_blocking(move || sync_parent_dir(&cursor_path))
			.await
			.map_err(|e| anyhow::anyhow!("Failed to sync data directory: {}", e))?;
		Ok(())
	}

	async fn save_missed_block(&self, block: u64) -> Result<(), anyhow::Error> {
		Self::ensure_parent(&self.missed_blocks_path).await?;

		// Open file in append mode, create if it doesn't exist
		let mut file = tokio::fs::OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.missed_blocks_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to create missed block file: {}", e))?;

		file.write_all(format!("{}\n", block).as_bytes())
			.await
			.map_err(|e| anyhow::anyhow!("Failed to save missed block: {}", e))?;
		file.sync_data()
			.await
			.map_err(|e| anyhow::anyhow!("Failed to save missed block: {}", e))?;

		Ok(())
	}

	async fn get_missed_blocks(&self) -> Result<Vec<u64>, anyhow::Error> {
		if !self.missed_blocks_path.exists() {
			return Ok(Vec::new());
		}
		let content = tokio::fs::read_to_string(&self.missed_blocks_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to read missed blocks: {}", e))?;
		content
			.lines()
			.filter(|line| !line.trim().is_empty())
			.map(|line| {
				line.trim()
					.parse::<u64>()
					.map_err(|e| anyhow::anyhow!("Failed to parse missed block: {}", e))
			})
			.collect()
	}
}
