//! Password hashing
//!
//! The rest of the crate treats hashes as opaque bytes and only talks to the
//! [`PasswordHasher`] trait.

use crate::error::{Error, Result};

/// bcrypt ignores input past this many bytes, so longer passwords are rejected up front
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Lowest work factor bcrypt accepts
pub const MIN_COST: u32 = 4;

/// Highest work factor bcrypt accepts
pub const MAX_COST: u32 = 31;

/// One-way password hashing
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password
    fn hash(&self, plain: &str) -> Result<Vec<u8>>;

    /// Check a plaintext password against a stored hash
    fn verify(&self, hash: &[u8], plain: &str) -> Result<bool>;
}

/// bcrypt-backed hasher
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Create a hasher with the given work factor
    ///
    /// The cost is not checked here; see [`validate_cost`].
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<Vec<u8>> {
        bcrypt::hash(plain, self.cost)
            .map(String::into_bytes)
            .map_err(|e| Error::PasswordHash(e.to_string()))
    }

    fn verify(&self, hash: &[u8], plain: &str) -> Result<bool> {
        // bcrypt hashes are ASCII; anything else cannot match
        let Ok(hash) = std::str::from_utf8(hash) else {
            return Ok(false);
        };
        bcrypt::verify(plain, hash).map_err(|e| Error::PasswordHash(e.to_string()))
    }
}

/// Check that a password can be hashed without silent truncation
pub fn validate_password(plain: &str) -> Result<()> {
    if plain.is_empty() {
        return Err(Error::Validation("password cannot be empty".to_string()));
    }
    if plain.len() > MAX_PASSWORD_BYTES {
        return Err(Error::Validation(format!(
            "password cannot be longer than {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

/// Check that bcrypt accepts `cost` as a work factor
pub fn validate_cost(cost: u32) -> Result<()> {
    if !(MIN_COST..=MAX_COST).contains(&cost) {
        return Err(Error::Configuration(format!(
            "password cost must be between {} and {}, got {}",
            MIN_COST, MAX_COST, cost
        )));
    }
    Ok(())
}
