//! JSON lines transaction log.
//!
//! One record per line, appended in place. A failed append is rolled back to the previous
//! length, and an append never starts in the middle of a line, so a stray fragment can only
//! cost its own line. Recovery truncates an unterminated tail and skips unreadable lines.
//! Hashes of the most recent records are kept in memory to suppress replays.

use async_trait::async_trait;
use std::{
	collections::{HashSet, VecDeque},
	fs::{self, OpenOptions},
	io::Write,
	os::unix::fs::FileExt,
	path::{Path, PathBuf},
	sync::{Arc, Mutex},
};

use crate::{
	models::TransactionRecord,
	services::store::{path_metadata, with_exclusive_access, StoreError, TransactionStore},
};

/// Number of recent hashes remembered for de-duplication, well above one block's transactions
const DEFAULT_DEDUP_WINDOW: usize = 50_000;

/// Hashes of the most recently stored records, oldest evicted first
#[derive(Debug)]
struct RecentHashes {
	order: VecDeque<String>,
	index: HashSet<String>,
	capacity: usize,
}

impl RecentHashes {
	fn new(capacity: usize) -> Self {
		Self {
			order: VecDeque::new(),
			index: HashSet::new(),
			capacity,
		}
	}

	fn contains(&self, hash: &str) -> bool {
		self.index.contains(hash)
	}

	fn insert(&mut self, hash: String) {
		if !self.index.insert(hash.clone()) {
			return;
		}
		self.order.push_back(hash);
		while self.order.len() > self.capacity {
			if let Some(oldest) = self.order.pop_front() {
				self.index.remove(&oldest);
			}
		}
	}
}

/// Transaction log stored as newline-delimited JSON
#[derive(Clone, Debug)]
pub struct JsonLinesStore {
	path: PathBuf,
	dedup_window: usize,
	seen: Arc<Mutex<Option<RecentHashes>>>,
}

impl JsonLinesStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self::with_dedup_window(path, DEFAULT_DEDUP_WINDOW)
	}

	/// Store remembering at most `window` recent hashes for de-duplication
	pub fn with_dedup_window(path: impl Into<PathBuf>, window: usize) -> Self {
		Self {
			path: path.into(),
			dedup_window: window.max(1),
			seen: Arc::new(Mutex::new(None)),
		}
	}
}

/// Result of scanning a log
struct Scan {
	records: Vec<TransactionRecord>,
	/// Length up to and including the last newline
	complete_len: usize,
	total_len: usize,
	skipped_lines: usize,
}

/// Parses every newline-terminated line, skipping the ones that are not records
fn scan(path: &Path) -> Result<Scan, StoreError> {
	let content = match fs::read(path) {
		Ok(content) => content,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
		Err(e) => {
			return Err(StoreError::io(
				"Failed to read store",
				Some(Box::new(e)),
				path_metadata(path),
			))
		}
	};

	let mut records = Vec::new();
	let mut skipped_lines = 0;
	let mut complete_len = 0;
	while let Some(offset) = content[complete_len..].iter().position(|b| *b == b'\n') {
		let line = &content[complete_len..complete_len + offset];
		complete_len += offset + 1;
		if line.iter().all(u8::is_ascii_whitespace) {
			continue;
		}
		match serde_json::from_slice::<TransactionRecord>(line) {
			Ok(record) => records.push(record),
			Err(_) => skipped_lines += 1,
		}
	}

	Ok(Scan {
		records,
		complete_len,
		total_len: content.len(),
		skipped_lines,
	})
}

/// Truncates an unterminated tail and returns the hashes of the stored records in order
fn recover(path: &Path) -> Result<Vec<String>, StoreError> {
	let scan = scan(path)?;
	if scan.skipped_lines > 0 {
		tracing::warn!(
			path = %path.display(),
			skipped_lines = scan.skipped_lines,
			"Store contains unreadable lines, skipping them"
		);
	}
	if scan.complete_len < scan.total_len {
		tracing::warn!(
			path = %path.display(),
			kept_records = scan.records.len(),
			dropped_bytes = scan.total_len - scan.complete_len,
			"Truncating unterminated tail of store"
		);
		let file = OpenOptions::new().write(true).open(path).map_err(|e| {
			StoreError::io("Failed to open store", Some(Box::new(e)), path_metadata(path))
		})?;
		file.set_len(scan.complete_len as u64)
			.and_then(|_| file.sync_all())
			.map_err(|e| {
				StoreError::io(
					"Failed to truncate store",
					Some(Box::new(e)),
					path_metadata(path),
				)
			})?;
	}
	Ok(scan.records.into_iter().map(|r| r.tx_hash).collect())
}

fn open_for_append(path: &Path) -> Result<fs::File, StoreError> {
	OpenOptions::new()
		.create(true)
		.read(true)
		.append(true)
		.open(path)
		.map_err(|e| StoreError::io("Failed to open store", Some(Box::new(e)), path_metadata(path)))
}

/// Whether the last byte of a non-empty file is a newline
fn ends_with_newline(file: &fs::File, len: u64, path: &Path) -> Result<bool, StoreError> {
	let mut last = [0u8; 1];
	file.read_exact_at(&mut last, len - 1).map_err(|e| {
		StoreError::io("Failed to read store", Some(Box::new(e)), path_metadata(path))
	})?;
	Ok(last[0] == b'\n')
}

/// Appends `buffer`, restoring the previous length if the write does not complete
fn append_or_roll_back(path: &Path, mut buffer: Vec<u8>) -> Result<(), StoreError> {
	let mut file = open_for_append(path)?;
	let start_len = file
		.metadata()
		.map_err(|e| {
			StoreError::io("Failed to read store metadata", Some(Box::new(e)), path_metadata(path))
		})?
		.len();

	// Fragment of an earlier write that could not be rolled back
	if start_len > 0 && !ends_with_newline(&file, start_len, path)? {
		buffer.insert(0, b'\n');
	}

	if let Err(e) = file.write_all(&buffer).and_then(|_| file.sync_data()) {
		if let Err(rollback) = file.set_len(start_len) {
			tracing::error!(
				path = %path.display(),
				error = %rollback,
				"Failed to roll back partial append"
			);
		}
		return Err(StoreError::io(
			"Failed to append to store",
			Some(Box::new(e)),
			path_metadata(path),
		));
	}
	Ok(())
}

#[async_trait]
impl TransactionStore for JsonLinesStore {
	fn path(&self) -> &Path {
		&self.path
	}

	async fn ensure_initialized(&self) -> Result<(), StoreError> {
		let seen = self.seen.clone();
		let window = self.dedup_window;
		with_exclusive_access(&self.path, move |path| {
			if !path.exists() {
				open_for_append(path)?;
				tracing::info!("Created transaction log {}", path.display());
			}
			let mut recent = RecentHashes::new(window);
			recover(path)?.into_iter().for_each(|hash| recent.insert(hash));
			*seen.lock().unwrap_or_else(|e| e.into_inner()) = Some(recent);
			Ok(())
		})
		.await
	}

	async fn append_all(&self, records: Vec<TransactionRecord>) -> Result<usize, StoreError> {
		if records.is_empty() {
			return Ok(0);
		}

		let seen = self.seen.clone();
		let window = self.dedup_window;
		with_exclusive_access(&self.path, move |path| {
			let mut seen = seen.lock().unwrap_or_else(|e| e.into_inner());
			if seen.is_none() {
				let mut recent = RecentHashes::new(window);
				recover(path)?.into_iter().for_each(|hash| recent.insert(hash));
				*seen = Some(recent);
			}
			let Some(recent) = seen.as_mut() else {
				return Ok(0);
			};

			let mut buffer = Vec::new();
			let mut pending: Vec<String> = Vec::new();
			for record in &records {
				if recent.contains(&record.tx_hash) || pending.contains(&record.tx_hash) {
					tracing::debug!("Skipping already stored transaction {}", record.tx_hash);
					continue;
				}
				serde_json::to_writer(&mut buffer, record).map_err(|e| {
					StoreError::serialization(
						"Failed to serialize record",
						Some(Box::new(e)),
						path_metadata(path),
					)
				})?;
				buffer.push(b'\n');
				pending.push(record.tx_hash.clone());
			}

			if pending.is_empty() {
				return Ok(0);
			}

			append_or_roll_back(path, buffer)?;

			let written = pending.len();
			pending.into_iter().for_each(|hash| recent.insert(hash));
			Ok(written)
		})
		.await
	}

	async fn read_all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
		with_exclusive_access(&self.path, |path| {
			let scan = scan(path)?;
			if scan.skipped_lines > 0 || scan.complete_len < scan.total_len {
				tracing::warn!(
					path = %path.display(),
					skipped_lines = scan.skipped_lines,
					"Ignoring unreadable content of store"
				);
			}
			Ok(scan.records)
		})
		.await
	}
}
