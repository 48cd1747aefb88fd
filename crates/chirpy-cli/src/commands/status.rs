//! Status command handler

use anyhow::Result;

use chirpy_core::Chirpy;

use crate::output::Output;

/// Show database location, size and record counts
pub fn show(chirpy: &Chirpy, output: &Output) -> Result<()> {
    let status = chirpy.status()?;
    output.print_status(&status);
    Ok(())
}
