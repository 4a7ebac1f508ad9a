//! JSON array transaction log.
//!
//! The whole log is one pretty-printed JSON array, the format downstream tooling reads.
//! Every append reads the array, adds the new records and replaces the file through a
//! temporary file and a rename, so a crash mid-write leaves the previous version intact.

use async_trait::async_trait;
use std::{
	collections::HashSet,
	fs,
	io::Write,
	path::{Path, PathBuf},
};

use crate::{
	models::TransactionRecord,
	services::store::{
		lock::sibling_path, path_metadata, sync_parent_dir, with_exclusive_access, StoreError,
		TransactionStore,
	},
};

/// Transaction log stored as a single JSON array
#[derive(Clone, Debug)]
pub struct JsonArrayStore {
	path: PathBuf,
}

impl JsonArrayStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

/// Reads the array at `path`. A missing or blank file is an empty log.
fn read_records(path: &Path) -> Result<Vec<TransactionRecord>, StoreError> {
	let content = match fs::read_to_string(path) {
		Ok(content) => content,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
		Err(e) => {
			return Err(StoreError::io(
				"Failed to read store",
				Some(Box::new(e)),
				path_metadata(path),
			))
		}
	};

	if content.trim().is_empty() {
		return Ok(Vec::new());
	}

	serde_json::from_str(&content).map_err(|e| {
		StoreError::corruption(
			"Store content is not a JSON array of records",
			Some(Box::new(e)),
			path_metadata(path),
		)
	})
}

/// Like [`read_records`], but unreadable content is logged and treated as empty
fn read_records_lossy(path: &Path) -> Result<Vec<TransactionRecord>, StoreError> {
	match read_records(path) {
		Err(error @ StoreError::Corruption(_)) => {
			tracing::warn!(
				error = %error,
				"Discarding unreadable store content, starting a new log"
			);
			Ok(Vec::new())
		}
		other => other,
	}
}

/// Replaces the file at `path` with `records` through `<path>.tmp`
fn write_records(path: &Path, records: &[TransactionRecord]) -> Result<(), StoreError> {
	let body = serde_json::to_vec_pretty(records).map_err(|e| {
		StoreError::serialization(
			"Failed to serialize records",
			Some(Box::new(e)),
			path_metadata(path),
		)
	})?;

	let tmp_path = sibling_path(path, ".tmp");
	let io_error = |msg: &str, e: std::io::Error| {
		StoreError::io(msg.to_string(), Some(Box::new(e)), path_metadata(path))
	};

	let mut file = fs::File::create(&tmp_path)
		.map_err(|e| io_error("Failed to create temporary store file", e))?;
	file.write_all(&body)
		.and_then(|_| file.sync_all())
		.map_err(|e| io_error("Failed to write temporary store file", e))?;
	fs::rename(&tmp_path, path).map_err(|e| io_error("Failed to replace store file", e))?;
	sync_parent_dir(path);
	Ok(())
}

#[async_trait]
impl TransactionStore for JsonArrayStore {
	fn path(&self) -> &Path {
		&self.path
	}

	async fn ensure_initialized(&self) -> Result<(), StoreError> {
		with_exclusive_access(&self.path, |path| {
			if path.exists() {
				return Ok(());
			}
			write_records(path, &[])?;
			tracing::info!("Created transaction log {}", path.display());
			Ok(())
		})
		.await
	}

	async fn append_all(&self, records: Vec<TransactionRecord>) -> Result<usize, StoreError> {
		if records.is_empty() {
			return Ok(0);
		}

		with_exclusive_access(&self.path, move |path| {
			let mut stored = read_records_lossy(path)?;
			let mut seen: HashSet<String> = stored.iter().map(|r| r.tx_hash.clone()).collect();

			let before = stored.len();
			for record in records {
				if seen.insert(record.tx_hash.clone()) {
					stored.push(record);
				} else {
					tracing::debug!("Skipping already stored transaction {}", record.tx_hash);
				}
			}

			let written = stored.len() - before;
			if written > 0 {
				write_records(path, &stored)?;
			}
			Ok(written)
		})
		.await
	}

	async fn read_all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
		with_exclusive_access(&self.path, read_records).await
	}
}
