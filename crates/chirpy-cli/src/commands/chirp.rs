//! Chirp command handlers

use anyhow::{Context, Result};

use chirpy_core::{ChirpId, Chirpy, SortOrder, UserId};

use crate::output::Output;

/// Post a chirp
pub fn post(chirpy: &Chirpy, token: String, body: String, output: &Output) -> Result<()> {
    let token = super::access_token(&token)?;
    let chirp = chirpy
        .post_chirp(token, &body)
        .context("Failed to post chirp")?;

    output.success(&format!("Posted chirp: {}", chirp.id));
    output.print_chirp(&chirp);
    Ok(())
}

/// List chirps, optionally by one author
pub fn list(
    chirpy: &Chirpy,
    author_id: Option<UserId>,
    sort: Option<String>,
    output: &Output,
) -> Result<()> {
    let order = match sort {
        Some(s) => s.parse::<SortOrder>()?,
        None => SortOrder::default(),
    };

    let chirps = chirpy.list_chirps(author_id, order)?;
    output.print_chirps(&chirps);
    Ok(())
}

/// Show a single chirp
pub fn show(chirpy: &Chirpy, id: ChirpId, output: &Output) -> Result<()> {
    let chirp = chirpy.get_chirp(id)?;
    output.print_chirp(&chirp);
    Ok(())
}

/// Delete one of your chirps
pub fn delete(chirpy: &Chirpy, token: String, id: ChirpId, output: &Output) -> Result<()> {
    let token = super::access_token(&token)?;
    chirpy
        .delete_chirp(token, id)
        .with_context(|| format!("Failed to delete chirp {}", id))?;

    output.success(&format!("Deleted chirp: {}", id));
    Ok(())
}
