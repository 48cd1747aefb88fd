//! User repository
//!
//! Email uniqueness is checked inside the same write cycle as the insert or
//! update it guards. Email changes are cascaded into refresh tokens, which
//! reference users by email.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{User, UserId};
use crate::storage::Snapshot;
use crate::store::DocumentStore;

/// Typed access to users in the document store
#[derive(Debug, Clone)]
pub struct UserRepository {
    store: DocumentStore,
}

impl UserRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Create a user; fails with `Conflict` if the email is taken
    pub fn create(&self, email: &str, password_hash: Vec<u8>) -> Result<User> {
        validate_email(email)?;

        let user = self.store.update(|snapshot| {
            if snapshot.user_by_email(email).is_some() {
                return Err(Error::Conflict(format!("email {} already in use", email)));
            }

            let id = snapshot
                .allocate_user_id()
                .ok_or_else(|| Error::Validation("user id space exhausted".to_string()))?;
            let user = User {
                id,
                email: email.to_string(),
                password_hash,
                is_chirpy_red: false,
            };
            snapshot.users.insert(id, user.clone());
            Ok(user)
        })?;

        info!(user_id = user.id, "User created");
        Ok(user)
    }

    /// Get a user by id
    pub fn get(&self, id: UserId) -> Result<User> {
        self.store.read(|snapshot| {
            snapshot
                .users
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("user {}", id)))
        })
    }

    /// Get a user by email
    pub fn get_by_email(&self, email: &str) -> Result<User> {
        self.store.read(|snapshot| {
            snapshot
                .user_by_email(email)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("user {}", email)))
        })
    }

    /// All users, keyed by email
    pub fn list_all(&self) -> Result<BTreeMap<String, User>> {
        self.store.read(|snapshot| {
            Ok(snapshot
                .users
                .values()
                .map(|user| (user.email.clone(), user.clone()))
                .collect())
        })
    }

    /// Replace a user's email, password hash and membership flag wholesale
    pub fn update(
        &self,
        id: UserId,
        email: &str,
        password_hash: Vec<u8>,
        is_chirpy_red: bool,
    ) -> Result<User> {
        validate_email(email)?;
        self.store.update(|snapshot| {
            replace_user(snapshot, id, |old| User {
                id: old.id,
                email: email.to_string(),
                password_hash,
                is_chirpy_red,
            })
        })
    }

    /// Replace email and password hash, keeping the membership flag
    pub fn update_credentials(
        &self,
        id: UserId,
        email: &str,
        password_hash: Vec<u8>,
    ) -> Result<User> {
        validate_email(email)?;
        self.store.update(|snapshot| {
            replace_user(snapshot, id, |old| User {
                id: old.id,
                email: email.to_string(),
                password_hash,
                is_chirpy_red: old.is_chirpy_red,
            })
        })
    }

    /// Set the Chirpy Red membership flag
    pub fn set_chirpy_red(&self, id: UserId, is_chirpy_red: bool) -> Result<User> {
        let user = self.store.update(|snapshot| {
            replace_user(snapshot, id, |old| User {
                is_chirpy_red,
                ..old.clone()
            })
        })?;
        info!(user_id = id, is_chirpy_red, "Membership updated");
        Ok(user)
    }

    /// Number of stored users
    pub fn count(&self) -> Result<usize> {
        self.store.read(|snapshot| Ok(snapshot.users.len()))
    }
}

fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::Validation("email cannot be empty".to_string()));
    }
    Ok(())
}

/// Swap user `id` for the record built by `build`, inside a write cycle
///
/// Rejects emails owned by another user and rewrites refresh tokens bound
/// to the old email when it changes.
fn replace_user<F>(snapshot: &mut Snapshot, id: UserId, build: F) -> Result<User>
where
    F: FnOnce(&User) -> User,
{
    let old = snapshot
        .users
        .get(&id)
        .ok_or_else(|| Error::NotFound(format!("user {}", id)))?;
    let user = build(old);

    if user.email != old.email {
        if let Some(owner) = snapshot.user_by_email(&user.email) {
            if owner.id != id {
                return Err(Error::Conflict(format!(
                    "email {} already in use",
                    user.email
                )));
            }
        }

        let old_email = old.email.clone();
        let rewritten = cascade_email(snapshot, &old_email, &user.email);
        debug!(user_id = id, rewritten, "Refresh tokens moved to new email");
    }

    snapshot.users.insert(id, user.clone());
    Ok(user)
}

/// Point every refresh token bound to `old` at `new`; returns how many moved
fn cascade_email(snapshot: &mut Snapshot, old: &str, new: &str) -> usize {
    let mut rewritten = 0;
    for token in snapshot.refresh_tokens.values_mut() {
        if token.user_email == old {
            token.user_email = new.to_string();
            rewritten += 1;
        }
    }
    rewritten
}
