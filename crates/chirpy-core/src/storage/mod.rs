//! Storage layer
//!
//! Handles the on-disk representation of the database.
//!
//! ## Architecture
//!
//! - **Snapshot**: the whole database as one value, encoded as a JSON object
//! - **SnapshotFile**: reads the file and replaces it atomically
//!
//! Locking lives one level up, in [`crate::store::DocumentStore`].

pub mod error;
pub mod persistence;
pub mod snapshot;

pub use error::{StorageError, StorageResult};
pub use persistence::SnapshotFile;
pub use snapshot::{decode, encode, Snapshot};
