//! Errors returned by repositories, the session manager and the service
//!
//! The boundary layer maps these to responses; nothing here is retried.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur in a Chirpy operation
#[derive(Error, Debug)]
pub enum Error {
    /// The database file could not be read, written or decoded
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An entity, id or token does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// A unique field is already taken
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing, malformed or rejected credential
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A refresh token was presented after its expiry
    #[error("refresh token expired")]
    Expired,

    /// Authenticated, but not allowed to touch this resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Input failed validation
    #[error("invalid input: {0}")]
    Validation(String),

    /// Password hashing backend failure
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// Access token could not be signed
    #[error("failed to sign access token: {0}")]
    Token(String),

    /// Required configuration is missing or invalid
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Decode failure of the database file
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Error::Storage(e) if e.is_corrupt())
    }

    /// Filesystem failure while accessing the database file
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Storage(e) if e.is_io())
    }
}

/// Result type for Chirpy operations
pub type Result<T> = std::result::Result<T, Error>;
