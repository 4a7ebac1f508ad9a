//! Exclusive access to a store path.
//!
//! Writers in this process serialize on an async mutex shared by every store opened on the
//! same path. Writers in other processes are excluded with an advisory `flock` on a sibling
//! `<path>.lock` file, taken for the duration of one blocking operation.

use lazy_static::lazy_static;
use std::{
	collections::HashMap,
	ffi::OsString,
	fs::{File, OpenOptions},
	io,
	os::unix::io::AsRawFd,
	path::{Path, PathBuf},
	sync::{Arc, Mutex},
};

lazy_static! {
	static ref PATH_LOCKS: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>> =
		Mutex::new(HashMap::new());
}

/// Returns the in-process lock shared by every store on `path`
pub(crate) fn path_lock(path: &Path) -> Arc<tokio::sync::Mutex<()>> {
	let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
	let mut locks = PATH_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
	locks
		.entry(key)
		.or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
		.clone()
}

/// `<path><suffix>`, e.g. `eth.json.tmp`
pub(crate) fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
	let mut name = OsString::from(path.as_os_str());
	name.push(suffix);
	PathBuf::from(name)
}

/// Advisory lock held until dropped
#[derive(Debug)]
pub(crate) struct FileLock {
	file: File,
}

impl FileLock {
	/// Blocks until the exclusive lock on `<path>.lock` is granted
	pub(crate) fn acquire(path: &Path) -> io::Result<Self> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent)?;
		}
		let file = OpenOptions::new()
			.create(true)
			.truncate(false)
			.read(true)
			.write(true)
			.open(sibling_path(path, ".lock"))?;

		// SAFETY: the descriptor is owned by `file` and stays open for the lifetime of the guard
		let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
		if rc != 0 {
			return Err(io::Error::last_os_error());
		}
		Ok(Self { file })
	}
}

impl Drop for FileLock {
	fn drop(&mut self) {
		// SAFETY: see `acquire`; closing the file would release the lock as well
		unsafe {
			libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
		}
	}
}
