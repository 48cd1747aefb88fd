//! Access and refresh token primitives
//!
//! Access tokens are HS256 JWTs carrying the user id as subject. Refresh
//! tokens are 32 random bytes, hex encoded; their lifecycle lives in
//! [`crate::session`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::UserId;

/// Issuer claim on every access token
pub const ISSUER: &str = "chirpy";

/// Longest (and default) access token lifetime, in seconds
pub const MAX_ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Refresh token lifetime, in days
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 60;

/// Random bytes in a refresh token
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Registered claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Subject parsed back into a user id
    pub fn user_id(&self) -> Result<UserId> {
        self.sub
            .parse()
            .map_err(|_| Error::Unauthorized(format!("invalid token subject '{}'", self.sub)))
    }
}

/// Signs and verifies access tokens with a shared secret
#[derive(Clone)]
pub struct AccessTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for AccessTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokens").finish_non_exhaustive()
    }
}

impl AccessTokens {
    /// Create a signer from the configured secret
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Configuration("jwt_secret is not set".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Issue a token for `user_id`, valid from now
    pub fn issue(&self, user_id: UserId, expires_in: Option<Duration>) -> Result<String> {
        self.issue_at(user_id, expires_in, Utc::now())
    }

    /// Issue a token as if it were `now`
    pub fn issue_at(
        &self,
        user_id: UserId,
        expires_in: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let ttl = clamp_ttl(expires_in);
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Token(e.to_string()))
    }

    /// Verify signature, issuer and expiry; return the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::Unauthorized(format!("bad token: {}", e)))
    }

    /// Verify a token and return the user id it was issued to
    pub fn validate(&self, token: &str) -> Result<UserId> {
        self.verify(token)?.user_id()
    }
}

/// Requested lifetime, or the maximum when absent, non-positive or too long
pub fn clamp_ttl(requested: Option<Duration>) -> Duration {
    let max = Duration::seconds(MAX_ACCESS_TOKEN_TTL_SECS);
    match requested {
        Some(ttl) if ttl > Duration::zero() && ttl <= max => ttl,
        _ => max,
    }
}

/// Generate a new opaque refresh token value
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer(header: Option<&str>) -> Result<&str> {
    extract_scheme(header, "Bearer")
}

/// Extract the key from an `Authorization: ApiKey <key>` header value
pub fn extract_api_key(header: Option<&str>) -> Result<&str> {
    extract_scheme(header, "ApiKey")
}

fn extract_scheme<'a>(header: Option<&'a str>, scheme: &str) -> Result<&'a str> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::Unauthorized("missing Authorization header".to_string()))?;

    match header.split_once(' ') {
        Some((found, value)) if found == scheme && !value.trim().is_empty() => Ok(value.trim()),
        _ => Err(Error::Unauthorized(format!(
            "expected Authorization: {} <value>",
            scheme
        ))),
    }
}
