//! File-system key-value store
//!
//! # Layout
//!
//! ```text
//! {directory}/{namespace}/
//!   {sha256(key)}.json     # one serialized entry per key
//! ```

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

use crate::domain::cache::KeyValueStore;
use crate::domain::DomainError;

const ENTRY_EXTENSION: &str = "json";

/// Stores one file per key under a root directory
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileStore {
    /// Creates a store rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tmp_counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.root.join(format!("{}.{}", digest, ENTRY_EXTENSION))
    }

    fn tmp_path_for(&self, path: &Path) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let mut name = path.as_os_str().to_owned();
        name.push(format!(".{}.{}.tmp", std::process::id(), n));
        PathBuf::from(name)
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::storage(format!(
                "failed to read cache file: {}",
                e
            ))),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), DomainError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            DomainError::storage(format!("failed to create cache directory: {}", e))
        })?;

        let path = self.path_for(key);
        let tmp_path = self.tmp_path_for(&path);

        write_atomic(&tmp_path, &path, |tmp| fs::write(tmp, bytes))
    }

    fn remove(&self, key: &str) -> Result<(), DomainError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::storage(format!(
                "failed to remove cache file: {}",
                e
            ))),
        }
    }
}

/// Writes `tmp_path` with `write` and renames it over `path`
///
/// The temp file is removed whenever either step fails.
fn write_atomic(
    tmp_path: &Path,
    path: &Path,
    write: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<(), DomainError> {
    write(tmp_path).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        DomainError::storage(format!("failed to write temp file: {}", e))
    })?;

    fs::rename(tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        DomainError::storage(format!("failed to rename temp file: {}", e))
    })
}
