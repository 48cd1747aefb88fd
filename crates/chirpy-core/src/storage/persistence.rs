//! Database file persistence
//!
//! Reads and writes the snapshot file. Writes are atomic (write to a temp
//! file, sync, rename) so the database is never left partially written.
//!
//! Storage location: `~/.local/share/chirpy/database.json` (configurable via `Config`)

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::{StorageError, StorageResult};
use super::snapshot::{self, Snapshot};

/// File-level access to one snapshot file
///
/// Holds no lock and no cached state; callers serialize access.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Create a handle for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the file exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the file holding an empty snapshot if it does not exist yet
    ///
    /// Returns `true` when a new file was written.
    pub fn ensure(&self) -> StorageResult<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.save(&Snapshot::default())?;
        Ok(true)
    }

    /// Read and decode the current snapshot
    pub fn load(&self) -> StorageResult<Snapshot> {
        let bytes = fs::read(&self.path).map_err(|e| StorageError::from_read(e, self.path.clone()))?;

        snapshot::decode(&bytes).map_err(|e| StorageError::CorruptDocument {
            path: self.path.clone(),
            details: e.to_string(),
        })
    }

    /// Encode and atomically replace the file contents
    pub fn save(&self, snapshot: &Snapshot) -> StorageResult<()> {
        let bytes = snapshot::encode(snapshot).map_err(StorageError::Encode)?;
        atomic_write(&self.path, &bytes)
    }

    /// Size of the file in bytes
    pub fn size(&self) -> StorageResult<u64> {
        fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| StorageError::from_read(e, self.path.clone()))
    }
}

/// Temp file used while replacing `path`: the full file name plus `.tmp`
///
/// Appending keeps targets that differ only by extension from sharing a
/// temp file.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Same directory as the target, so the rename stays on one filesystem
    let temp_path = temp_path_for(path);

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| {
        let _ = fs::remove_file(&temp_path);
        StorageError::AtomicWriteFailed {
            from: temp_path.clone(),
            to: path.to_path_buf(),
            source,
        }
    })?;

    Ok(())
}
