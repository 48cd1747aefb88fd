//! Document store
//!
//! The `DocumentStore` gives atomic read-modify-write access to the snapshot
//! file. Every call:
//!
//! 1. takes the store-wide lock (shared for reads, exclusive for writes)
//! 2. decodes the file fresh; nothing is cached between calls
//! 3. runs the caller's closure
//! 4. for writes that return a new snapshot, replaces the file atomically
//! 5. releases the lock
//!
//! ## Locking
//!
//! Locks are process-wide and keyed by the canonical file path, so handles
//! are cheap values that can be created per operation and still exclude
//! each other. Separate processes are not coordinated.
//!
//! ## Usage
//!
//! ```ignore
//! let store = DocumentStore::open(config.database_path())?;
//!
//! let count = store.read(|snapshot| Ok::<_, Error>(snapshot.chirps.len()))?;
//!
//! let id = store.update(|snapshot| {
//!     let id = snapshot
//!         .allocate_chirp_id()
//!         .ok_or_else(|| Error::Validation("chirp id space exhausted".to_string()))?;
//!     snapshot.chirps.insert(id, chirp);
//!     Ok::<_, Error>(id)
//! })?;
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::storage::{Snapshot, SnapshotFile, StorageError, StorageResult};

/// Lock mode for a store call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Shared access; the snapshot is never written back
    ReadOnly,
    /// Exclusive access; a returned snapshot replaces the file
    ReadWrite,
}

/// Handle to the database file and its lock
#[derive(Debug, Clone)]
pub struct DocumentStore {
    file: SnapshotFile,
    lock: Arc<RwLock<()>>,
}

impl DocumentStore {
    /// Open the store at `path`, creating an empty database if none exists
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = canonical_path(path.as_ref())?;
        let lock = lock_for(&path);
        let store = Self {
            file: SnapshotFile::new(path),
            lock,
        };
        store.ensure()?;
        Ok(store)
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Size of the database file in bytes
    pub fn file_size(&self) -> StorageResult<u64> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.file.size()
    }

    /// Create the database file with an empty snapshot if it is missing
    pub fn ensure(&self) -> StorageResult<()> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        if self.file.ensure()? {
            info!(path = %self.file.path().display(), "Initialized empty database");
        }
        Ok(())
    }

    /// Replace the whole database with an empty snapshot
    pub fn reset(&self) -> StorageResult<()> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.file.save(&Snapshot::default())?;
        info!(path = %self.file.path().display(), "Database reset");
        Ok(())
    }

    /// Run `f` against a freshly decoded snapshot under the lock for `mode`
    ///
    /// `f` returns its result and optionally a replacement snapshot. The
    /// replacement is persisted only in `ReadWrite` mode. Any error from
    /// decoding, from `f` or from writing aborts the call and leaves the
    /// file as it was.
    pub fn with_snapshot<R, E, F>(&self, mode: AccessMode, f: F) -> Result<R, E>
    where
        F: FnOnce(Snapshot) -> Result<(R, Option<Snapshot>), E>,
        E: From<StorageError>,
    {
        match mode {
            AccessMode::ReadOnly => {
                let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
                let snapshot = self.file.load()?;
                debug!(path = %self.file.path().display(), "Read-only snapshot loaded");

                let (result, replacement) = f(snapshot)?;
                if replacement.is_some() {
                    warn!("Read-only store call returned a snapshot; discarding it");
                }
                Ok(result)
            }
            AccessMode::ReadWrite => {
                let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
                let snapshot = self.file.load()?;
                debug!(path = %self.file.path().display(), "Read-write snapshot loaded");

                let (result, replacement) = f(snapshot)?;
                if let Some(next) = replacement {
                    self.file.save(&next)?;
                    debug!(
                        chirps = next.chirps.len(),
                        users = next.users.len(),
                        refresh_tokens = next.refresh_tokens.len(),
                        "Snapshot persisted"
                    );
                }
                Ok(result)
            }
        }
    }

    /// Read-only access
    pub fn read<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&Snapshot) -> Result<R, E>,
        E: From<StorageError>,
    {
        self.with_snapshot(AccessMode::ReadOnly, |snapshot| {
            f(&snapshot).map(|result| (result, None))
        })
    }

    /// Exclusive read-modify-write
    ///
    /// The mutated snapshot is persisted when `f` succeeds; on error nothing
    /// is written.
    pub fn update<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Snapshot) -> Result<R, E>,
        E: From<StorageError>,
    {
        self.with_snapshot(AccessMode::ReadWrite, |mut snapshot| {
            let result = f(&mut snapshot)?;
            Ok((result, Some(snapshot)))
        })
    }
}

/// Resolve `path` to a stable key: canonical parent directory + file name
///
/// The file itself may not exist yet, so only the parent is canonicalized.
fn canonical_path(path: &Path) -> StorageResult<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        StorageError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("database path '{}' has no file name", path.display()),
        ))
    })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    })?;
    let parent = fs::canonicalize(parent).map_err(|e| StorageError::from_read(e, parent.to_path_buf()))?;

    Ok(parent.join(file_name))
}

/// Process-wide lock for a canonical database path
fn lock_for(path: &Path) -> Arc<RwLock<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<RwLock<()>>>>> = OnceLock::new();

    // The guarded data is `()`; a panic in another caller leaves nothing to repair.
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(path.to_path_buf()).or_default())
}
