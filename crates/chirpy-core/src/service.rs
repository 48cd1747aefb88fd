//! Service facade
//!
//! `Chirpy` bundles the configuration, the document store, the repositories
//! and the session manager behind one method per user-facing operation.
//! Callers pass raw credentials (access tokens, API keys); authorization is
//! decided here.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::profanity::{self, DEFAULT_BANNED_WORDS};
use crate::auth::{validate_password, AccessTokens, BcryptHasher, PasswordHasher};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Chirp, ChirpId, User, UserId};
use crate::repo::{validate_body, ChirpRepository, SortOrder, UserRepository};
use crate::session::SessionManager;
use crate::store::DocumentStore;

/// Billing event that grants Chirpy Red
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub user: User,
    /// Signed access token
    pub token: String,
    /// Opaque refresh token
    pub refresh_token: String,
}

/// Summary of the database file
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub database_path: PathBuf,
    pub file_size: u64,
    pub chirps: usize,
    pub users: usize,
    pub refresh_tokens: usize,
}

/// Entry point for every Chirpy operation
pub struct Chirpy {
    config: Config,
    store: DocumentStore,
    chirps: ChirpRepository,
    users: UserRepository,
    hasher: Arc<dyn PasswordHasher>,
}

impl std::fmt::Debug for Chirpy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chirpy")
            .field("database", &self.store.path())
            .finish_non_exhaustive()
    }
}

impl Chirpy {
    /// Open the database named by `config`, hashing with bcrypt at the configured cost
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let hasher = Arc::new(BcryptHasher::new(config.password_cost));
        Self::with_hasher(config, hasher)
    }

    /// Open with a custom password hasher
    pub fn with_hasher(config: Config, hasher: Arc<dyn PasswordHasher>) -> Result<Self> {
        let store = DocumentStore::open(config.database_path())?;
        debug!(path = %store.path().display(), "Chirpy opened");

        Ok(Self {
            chirps: ChirpRepository::new(store.clone()),
            users: UserRepository::new(store.clone()),
            config,
            store,
            hasher,
        })
    }

    /// Document store handle
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Build a session manager; fails if no JWT secret is configured
    pub fn sessions(&self) -> Result<SessionManager> {
        let secret = self.config.jwt_secret.as_deref().unwrap_or_default();
        let access_tokens = AccessTokens::new(secret)?;
        Ok(SessionManager::new(
            self.store.clone(),
            access_tokens,
            Arc::clone(&self.hasher),
        ))
    }

    // ==================== Users ====================

    /// Register a new user
    pub fn signup(&self, email: &str, password: &str) -> Result<User> {
        validate_password(password)?;
        let hash = self.hasher.hash(password)?;
        self.users.create(email, hash)
    }

    /// Log in with email and password
    ///
    /// `expires_in_seconds` requests a shorter access token lifetime; it is
    /// capped at one hour.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        expires_in_seconds: Option<i64>,
    ) -> Result<LoginResponse> {
        let session = self
            .sessions()?
            .login(email, password, expires_in_seconds.map(Duration::seconds))?;

        Ok(LoginResponse {
            user: session.user,
            token: session.access_token,
            refresh_token: session.refresh_token,
        })
    }

    /// Look up a user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.users.get_by_email(email)
    }

    /// Replace the caller's email and password, keeping their membership
    pub fn update_profile(&self, access_token: &str, email: &str, password: &str) -> Result<User> {
        let user_id = self.sessions()?.validate(access_token)?;
        validate_password(password)?;
        let hash = self.hasher.hash(password)?;

        let user = self.users.update_credentials(user_id, email, hash)?;
        info!(user_id, "Profile updated");
        Ok(user)
    }

    // ==================== Tokens ====================

    /// Exchange a refresh token for a new access token
    pub fn refresh(&self, refresh_token: &str) -> Result<String> {
        self.sessions()?.refresh(refresh_token)
    }

    /// Revoke a refresh token
    pub fn revoke(&self, refresh_token: &str) -> Result<()> {
        self.sessions()?.revoke(refresh_token)
    }

    // ==================== Chirps ====================

    /// Post a chirp as the holder of `access_token`
    ///
    /// The body is checked as written, then banned words are masked.
    pub fn post_chirp(&self, access_token: &str, body: &str) -> Result<Chirp> {
        let author_id = self.sessions()?.validate(access_token)?;
        validate_body(body)?;

        let cleaned = profanity::clean(body, DEFAULT_BANNED_WORDS);
        self.chirps.create(&cleaned, author_id)
    }

    /// List chirps, optionally by one author
    pub fn list_chirps(&self, author_id: Option<UserId>, order: SortOrder) -> Result<Vec<Chirp>> {
        self.chirps.list(author_id, order)
    }

    /// Get a chirp by id
    pub fn get_chirp(&self, id: ChirpId) -> Result<Chirp> {
        self.chirps.get(id)
    }

    /// Delete one of the caller's chirps
    pub fn delete_chirp(&self, access_token: &str, id: ChirpId) -> Result<()> {
        let user_id = self.sessions()?.validate(access_token)?;
        let chirp = self.chirps.get(id)?;

        if chirp.author_id != user_id {
            warn!(chirp_id = id, user_id, "Delete refused: not the author");
            return Err(Error::Forbidden(format!("chirp {} belongs to another user", id)));
        }

        self.chirps.delete(id)
    }

    // ==================== Webhooks ====================

    /// Apply a billing provider event
    ///
    /// Returns `true` when a user was upgraded. Events other than
    /// `user.upgraded` are accepted and ignored.
    pub fn handle_polka_webhook(&self, api_key: &str, event: &str, user_id: UserId) -> Result<bool> {
        let expected = self
            .config
            .polka_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Unauthorized("webhook API key is not configured".to_string()))?;

        if api_key != expected {
            warn!("Webhook rejected: API key mismatch");
            return Err(Error::Unauthorized("invalid API key".to_string()));
        }

        if event != USER_UPGRADED_EVENT {
            debug!(event, "Ignoring webhook event");
            return Ok(false);
        }

        self.users.set_chirpy_red(user_id, true)?;
        Ok(true)
    }

    // ==================== Maintenance ====================

    /// Wipe the database back to an empty snapshot
    pub fn reset(&self) -> Result<()> {
        self.store.reset()?;
        Ok(())
    }

    /// Counts and file size of the database
    pub fn status(&self) -> Result<StoreStatus> {
        let (chirps, users, refresh_tokens) = self.store.read(|snapshot| {
            Ok::<_, Error>((
                snapshot.chirps.len(),
                snapshot.users.len(),
                snapshot.refresh_tokens.len(),
            ))
        })?;

        Ok(StoreStatus {
            database_path: self.store.path().to_path_buf(),
            file_size: self.store.file_size()?,
            chirps,
            users,
            refresh_tokens,
        })
    }
}
