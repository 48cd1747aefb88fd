//! Webhook command handlers

use anyhow::{Context, Result};

use chirpy_core::auth::extract_api_key;
use chirpy_core::{Chirpy, UserId};

use crate::output::Output;

/// Deliver a Polka billing event
///
/// `authorization` is the header value the provider sends, `ApiKey <key>`.
pub fn polka(
    chirpy: &Chirpy,
    authorization: String,
    event: String,
    user_id: UserId,
    output: &Output,
) -> Result<()> {
    let api_key = extract_api_key(Some(&authorization))?;
    let upgraded = chirpy
        .handle_polka_webhook(api_key, &event, user_id)
        .context("Webhook rejected")?;

    if upgraded {
        output.success(&format!("User {} upgraded to Chirpy Red", user_id));
    } else {
        output.message(&format!("Event '{}' ignored", event));
    }
    Ok(())
}
