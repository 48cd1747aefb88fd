//! Command handlers
//!
//! Each handler takes already-parsed arguments, calls the `Chirpy` facade
//! and prints through [`Output`](crate::output::Output).

pub mod chirp;
pub mod config;
pub mod status;
pub mod token;
pub mod user;
pub mod webhook;

use anyhow::Result;

use chirpy_core::auth::extract_bearer;

/// Accept either a full `Bearer <token>` header value or a bare token
pub fn access_token(value: &str) -> Result<&str> {
    if value.trim_start().starts_with("Bearer ") {
        Ok(extract_bearer(Some(value))?)
    } else {
        Ok(value.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_forms() {
        assert_eq!(access_token("Bearer abc.def").unwrap(), "abc.def");
        assert_eq!(access_token(" abc.def ").unwrap(), "abc.def");
        assert!(access_token("Bearer  ").is_err());
    }
}
