//! Durable transaction logs.
//!
//! Each chain appends its records to one file through a [`TransactionStore`]:
//! - [`JsonArrayStore`]: a single pretty-printed JSON array, rewritten atomically on append
//! - [`JsonLinesStore`]: one JSON object per line, appended in place
//!
//! Both serialize writers on the same path, in and across processes, and skip records whose
//! transaction hash is already stored so a replayed block never duplicates records.

mod error;
mod json_array;
mod json_lines;
mod lock;

pub use error::StoreError;
pub use json_array::JsonArrayStore;
pub use json_lines::JsonLinesStore;

use async_trait::async_trait;
use std::{
	collections::HashMap,
	path::{Path, PathBuf},
	sync::Arc,
};

use crate::models::{ChainConfig, StoreFormat, TransactionRecord};
use lock::{path_lock, FileLock};

/// Interface for transaction log implementations
#[async_trait]
pub trait TransactionStore: Send + Sync {
	/// Path of the backing file
	fn path(&self) -> &Path;

	/// Creates an empty log if none exists; existing content is never modified
	async fn ensure_initialized(&self) -> Result<(), StoreError>;

	/// Appends one record
	///
	/// # Returns
	/// * `Result<bool, StoreError>` - Whether the record was written (false when its hash is
	///   already stored)
	async fn append(&self, record: TransactionRecord) -> Result<bool, StoreError> {
		Ok(self.append_all(vec![record]).await? == 1)
	}

	/// Appends records in the given order under a single lock acquisition
	///
	/// # Returns
	/// * `Result<usize, StoreError>` - Number of records written after de-duplication
	async fn append_all(&self, records: Vec<TransactionRecord>) -> Result<usize, StoreError>;

	/// Reads every stored record in order
	async fn read_all(&self) -> Result<Vec<TransactionRecord>, StoreError>;
}

/// Opens the store selected by the chain's `store_format`
pub fn store_for_chain(chain: &ChainConfig) -> Arc<dyn TransactionStore> {
	match chain.store_format {
		StoreFormat::JsonArray => Arc::new(JsonArrayStore::new(chain.output_path.clone())),
		StoreFormat::JsonLines => Arc::new(JsonLinesStore::new(chain.output_path.clone())),
	}
}

pub(crate) fn path_metadata(path: &Path) -> Option<HashMap<String, String>> {
	Some(HashMap::from([(
		"path".to_string(),
		path.display().to_string(),
	)]))
}

/// Runs `op` on a blocking thread while holding both the in-process and the file lock
pub(crate) async fn with_exclusive_access<T, F>(path: &Path, op: F) -> Result<T, StoreError>
where
	T: Send + 'static,
	F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
{
	let lock = path_lock(path);
	let _guard = lock.lock().await;
	let path: PathBuf = path.to_path_buf();

	tokio::task::spawn_blocking(move || {
		let _file_lock = FileLock::acquire(&path).map_err(|e| {
			StoreError::io("Failed to lock store", Some(Box::new(e)), path_metadata(&path))
		})?;
		op(&path)
	})
	.await
	.map_err(|e| StoreError::io("Store task failed", Some(Box::new(e)), None))?
}

/// Flushes a rename to disk by syncing the containing directory
pub(crate) fn sync_parent_dir(path: &Path) {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		if let Ok(dir) = std::fs::File::open(parent) {
			let _ = dir.sync_all();
		}
	}
}
