//! Refresh token command handlers

use anyhow::{Context, Result};

use chirpy_core::Chirpy;

use crate::output::Output;

/// Exchange a refresh token for a new access token
pub fn refresh(chirpy: &Chirpy, refresh_token: String, output: &Output) -> Result<()> {
    let token = super::access_token(&refresh_token)?;
    let access = chirpy.refresh(token).context("Failed to refresh")?;

    output.print_access_token(&access);
    Ok(())
}

/// Revoke a refresh token
pub fn revoke(chirpy: &Chirpy, refresh_token: String, output: &Output) -> Result<()> {
    let token = super::access_token(&refresh_token)?;
    chirpy.revoke(token).context("Failed to revoke token")?;

    output.success("Refresh token revoked");
    Ok(())
}
