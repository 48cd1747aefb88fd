//! Authentication collaborators
//!
//! - `password`: one-way hashing behind the `PasswordHasher` trait
//! - `token`: signed access tokens and opaque refresh token values
//! - `profanity`: chirp body masking

pub mod password;
pub mod profanity;
pub mod token;

pub use password::{
    validate_cost, validate_password, BcryptHasher, PasswordHasher, MAX_COST, MAX_PASSWORD_BYTES,
    MIN_COST,
};
pub use token::{extract_api_key, extract_bearer, generate_refresh_token, AccessTokens, Claims};
