//! Session manager
//!
//! Issues access tokens on login and keeps the refresh token lifecycle:
//! refresh tokens are persisted through [`RefreshTokenRepository`] and are
//! only removed when revoked or when a refresh observes them expired.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::auth::token::REFRESH_TOKEN_TTL_DAYS;
use crate::auth::{generate_refresh_token, AccessTokens, PasswordHasher};
use crate::error::{Error, Result};
use crate::models::{User, UserId};
use crate::repo::{RefreshTokenRepository, UserRepository};
use crate::store::DocumentStore;

/// Credentials handed out by a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Login, refresh, revoke and access token validation
#[derive(Clone)]
pub struct SessionManager {
    users: UserRepository,
    refresh_tokens: RefreshTokenRepository,
    access_tokens: AccessTokens,
    hasher: Arc<dyn PasswordHasher>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("users", &self.users)
            .field("refresh_tokens", &self.refresh_tokens)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(
        store: DocumentStore,
        access_tokens: AccessTokens,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            refresh_tokens: RefreshTokenRepository::new(store),
            access_tokens,
            hasher,
        }
    }

    /// Check a password and issue a new access/refresh token pair
    ///
    /// `expires_in` is clamped to the access token maximum. Unknown emails
    /// fail with `NotFound`, wrong passwords with `Unauthorized`.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        expires_in: Option<Duration>,
    ) -> Result<Session> {
        let user = self.users.get_by_email(email)?;

        if !self.hasher.verify(&user.password_hash, password)? {
            warn!(user_id = user.id, "Login rejected: wrong password");
            return Err(Error::Unauthorized("incorrect email or password".to_string()));
        }

        let access_token = self.access_tokens.issue(user.id, expires_in)?;

        let refresh_token = generate_refresh_token();
        let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS);
        self.refresh_tokens
            .create(&refresh_token, &user.email, expires_at)?;

        info!(user_id = user.id, "User logged in");
        Ok(Session {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new one-hour access token
    ///
    /// An expired token is deleted and reported as `Expired`. The refresh
    /// token itself stays valid until it expires or is revoked.
    pub fn refresh(&self, refresh_token: &str) -> Result<String> {
        let record = self
            .refresh_tokens
            .get(refresh_token)?
            .ok_or_else(|| Error::Unauthorized("unknown refresh token".to_string()))?;

        if record.is_expired_at(Utc::now()) {
            match self.refresh_tokens.delete(refresh_token) {
                // A concurrent refresh may already have removed it
                Ok(()) | Err(Error::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
            warn!(expired_at = %record.expires_at, "Expired refresh token removed");
            return Err(Error::Expired);
        }

        let user = match self.users.get_by_email(&record.user_email) {
            Ok(user) => user,
            Err(Error::NotFound(_)) => {
                warn!("Refresh token bound to a missing user");
                return Err(Error::Unauthorized(
                    "refresh token owner no longer exists".to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        self.access_tokens.issue(user.id, None)
    }

    /// Delete a refresh token; `NotFound` if it is not stored
    pub fn revoke(&self, refresh_token: &str) -> Result<()> {
        self.refresh_tokens.delete(refresh_token)
    }

    /// Verify an access token and return its user id
    pub fn validate(&self, access_token: &str) -> Result<UserId> {
        self.access_tokens.validate(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::BcryptHasher;
    use crate::auth::token::REFRESH_TOKEN_BYTES;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        store: DocumentStore,
        sessions: SessionManager,
        hasher: Arc<dyn PasswordHasher>,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("database.json")).unwrap();
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(crate::auth::MIN_COST));
        let sessions = SessionManager::new(
            store.clone(),
            AccessTokens::new("test-secret").unwrap(),
            Arc::clone(&hasher),
        );
        Fixture {
            _temp_dir: temp_dir,
            store,
            sessions,
            hasher,
        }
    }

    fn signup(f: &Fixture, email: &str, password: &str) -> User {
        let hash = f.hasher.hash(password).unwrap();
        UserRepository::new(f.store.clone()).create(email, hash).unwrap()
    }

    #[test]
    fn test_login_scenario() {
        let f = fixture();
        let user = signup(&f, "a@x.com", "pw");
        let tokens = RefreshTokenRepository::new(f.store.clone());

        let wrong = f.sessions.login("a@x.com", "nope", None);
        assert!(matches!(wrong, Err(Error::Unauthorized(_))));
        assert_eq!(tokens.count().unwrap(), 0);

        let before = Utc::now();
        let session = f.sessions.login("a@x.com", "pw", None).unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(f.sessions.validate(&session.access_token).unwrap(), user.id);

        assert_eq!(session.refresh_token.len(), REFRESH_TOKEN_BYTES * 2);
        assert!(session.refresh_token.chars().all(|c| c.is_ascii_hexdigit()));

        let record = tokens.get(&session.refresh_token).unwrap().unwrap();
        assert_eq!(record.user_email, "a@x.com");
        let lifetime = record.expires_at - before;
        assert!(lifetime >= Duration::days(60));
        assert!(lifetime < Duration::days(60) + Duration::minutes(1));
    }

    #[test]
    fn test_login_unknown_email() {
        let f = fixture();
        assert!(matches!(
            f.sessions.login("ghost@x.com", "pw", None),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_refresh_issues_access_token() {
        let f = fixture();
        let user = signup(&f, "a@x.com", "pw");
        let session = f.sessions.login("a@x.com", "pw", None).unwrap();

        let access = f.sessions.refresh(&session.refresh_token).unwrap();
        assert_eq!(f.sessions.validate(&access).unwrap(), user.id);

        // Not rotated: the same refresh token keeps working
        assert!(f.sessions.refresh(&session.refresh_token).is_ok());
    }

    #[test]
    fn test_refresh_unknown_token() {
        let f = fixture();
        assert!(matches!(
            f.sessions.refresh("deadbeef"),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_refresh_token_is_removed() {
        let f = fixture();
        signup(&f, "a@x.com", "pw");
        let tokens = RefreshTokenRepository::new(f.store.clone());
        tokens
            .create("stale", "a@x.com", Utc::now() - Duration::seconds(1))
            .unwrap();

        assert!(matches!(f.sessions.refresh("stale"), Err(Error::Expired)));
        assert!(tokens.get("stale").unwrap().is_none());

        // Once removed it is simply unknown
        assert!(matches!(
            f.sessions.refresh("stale"),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_refresh_for_missing_user() {
        let f = fixture();
        RefreshTokenRepository::new(f.store.clone())
            .create("orphan", "gone@x.com", Utc::now() + Duration::days(1))
            .unwrap();

        assert!(matches!(
            f.sessions.refresh("orphan"),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_refresh_follows_email_change() {
        let f = fixture();
        let user = signup(&f, "a@x.com", "pw");
        let session = f.sessions.login("a@x.com", "pw", None).unwrap();

        UserRepository::new(f.store.clone())
            .update_credentials(user.id, "b@x.com", user.password_hash.clone())
            .unwrap();

        let access = f.sessions.refresh(&session.refresh_token).unwrap();
        assert_eq!(f.sessions.validate(&access).unwrap(), user.id);
    }

    #[test]
    fn test_revoke() {
        let f = fixture();
        signup(&f, "a@x.com", "pw");
        let session = f.sessions.login("a@x.com", "pw", None).unwrap();

        f.sessions.revoke(&session.refresh_token).unwrap();
        assert!(matches!(
            f.sessions.refresh(&session.refresh_token),
            Err(Error::Unauthorized(_))
        ));
        assert!(matches!(
            f.sessions.revoke(&session.refresh_token),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let f = fixture();
        assert!(matches!(
            f.sessions.validate("garbage"),
            Err(Error::Unauthorized(_))
        ));
    }
}
