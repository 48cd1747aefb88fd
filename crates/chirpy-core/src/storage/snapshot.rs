//! Snapshot codec
//!
//! The whole database is one JSON object:
//!
//! ```text
//! {
//!   "chirps":         { "<id>": Chirp, ... },
//!   "last_chirp_id":  <int>,
//!   "users":          { "<id>": User, ... },
//!   "last_user_id":   <int>,
//!   "refresh_tokens": { "<token>": RefreshToken, ... }
//! }
//! ```
//!
//! Missing keys (and explicit nulls) decode as empty collections or zero, so
//! a freshly created or hand-trimmed file still loads.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Chirp, ChirpId, RefreshToken, User, UserId};

/// The entire persisted state
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Snapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub chirps: BTreeMap<ChirpId, Chirp>,
    #[serde(deserialize_with = "null_as_default")]
    pub last_chirp_id: ChirpId,
    #[serde(deserialize_with = "null_as_default")]
    pub users: BTreeMap<UserId, User>,
    #[serde(deserialize_with = "null_as_default")]
    pub last_user_id: UserId,
    #[serde(deserialize_with = "null_as_default")]
    pub refresh_tokens: BTreeMap<String, RefreshToken>,
}

impl Snapshot {
    /// Allocate the next chirp id and advance the counter.
    ///
    /// Never hands out an id at or below one already present, even if the
    /// counter in the file lags behind the stored records. Returns `None`
    /// once the id space is exhausted; the counter is left untouched.
    pub fn allocate_chirp_id(&mut self) -> Option<ChirpId> {
        let next = next_id(self.last_chirp_id, self.chirps.keys().next_back())?;
        self.last_chirp_id = next;
        Some(next)
    }

    /// Allocate the next user id and advance the counter.
    pub fn allocate_user_id(&mut self) -> Option<UserId> {
        let next = next_id(self.last_user_id, self.users.keys().next_back())?;
        self.last_user_id = next;
        Some(next)
    }

    /// Find a user by email
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|user| user.email == email)
    }
}

fn next_id(counter: u64, highest: Option<&u64>) -> Option<u64> {
    let floor = highest.copied().unwrap_or(0);
    counter.max(floor).checked_add(1)
}

/// Encode a snapshot to bytes
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(snapshot)
}

/// Decode a snapshot from bytes
pub fn decode(bytes: &[u8]) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_slice(bytes)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
