//! Refresh token repository

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::RefreshToken;
use crate::store::DocumentStore;

/// Typed access to refresh tokens in the document store
#[derive(Debug, Clone)]
pub struct RefreshTokenRepository {
    store: DocumentStore,
}

impl RefreshTokenRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Store a token value bound to `user_email`
    ///
    /// Token values are the key; storing an existing value is a `Conflict`.
    pub fn create(
        &self,
        token: &str,
        user_email: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken> {
        let record = self.store.update(|snapshot| {
            if snapshot.refresh_tokens.contains_key(token) {
                return Err(Error::Conflict("refresh token already exists".to_string()));
            }

            let record = RefreshToken {
                token: token.to_string(),
                user_email: user_email.to_string(),
                expires_at,
            };
            snapshot
                .refresh_tokens
                .insert(record.token.clone(), record.clone());
            Ok(record)
        })?;

        debug!(expires_at = %record.expires_at, "Refresh token stored");
        Ok(record)
    }

    /// Look up a token value; `None` when unknown
    pub fn get(&self, token: &str) -> Result<Option<RefreshToken>> {
        self.store
            .read(|snapshot| Ok(snapshot.refresh_tokens.get(token).cloned()))
    }

    /// All tokens, keyed by value
    pub fn list_all(&self) -> Result<BTreeMap<String, RefreshToken>> {
        self.store
            .read(|snapshot| Ok(snapshot.refresh_tokens.clone()))
    }

    /// Remove a token value; fails with `NotFound` if it is not stored
    pub fn delete(&self, token: &str) -> Result<()> {
        self.store.update(|snapshot| {
            snapshot
                .refresh_tokens
                .remove(token)
                .map(|_| ())
                .ok_or_else(|| Error::NotFound("refresh token".to_string()))
        })?;

        info!("Refresh token revoked");
        Ok(())
    }

    /// Number of stored tokens
    pub fn count(&self) -> Result<usize> {
        self.store.read(|snapshot| Ok(snapshot.refresh_tokens.len()))
    }
}
