//! Data models for Chirpy
//!
//! Defines the persisted records: Chirp, User and RefreshToken.
//! Field names serialize in snake_case, matching the database file layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a chirp, assigned by the store
pub type ChirpId = u64;

/// Identifier of a user, assigned by the store
pub type UserId = u64;

/// Maximum chirp length in characters
pub const MAX_CHIRP_LENGTH: usize = 140;

/// A short text post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chirp {
    /// Unique identifier
    pub id: ChirpId,
    /// Post body, already profanity-masked
    pub body: String,
    /// The user who posted it
    pub author_id: UserId,
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// Login email, unique across users
    pub email: String,
    /// One-way password hash, never the plaintext
    #[serde(with = "base64_bytes", alias = "password")]
    pub password_hash: Vec<u8>,
    /// Paid membership flag, set by the billing webhook
    #[serde(default)]
    pub is_chirpy_red: bool,
}

/// A long-lived opaque credential exchanged for access tokens
///
/// Bound to its user by email, not by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshToken {
    /// Opaque token value (hex)
    pub token: String,
    /// Email of the user this token was issued to
    pub user_email: String,
    /// When this token stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Serde adapter storing byte strings as standard base64
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
