//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use chirpy_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
///
/// Secrets are reported as set or unset, never printed.
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "database_path": config.database_path(),
                    "jwt_secret_set": config.jwt_secret.is_some(),
                    "polka_api_key_set": config.polka_api_key.is_some(),
                    "password_cost": config.password_cost,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:      {}", config.data_dir.display());
            println!("  jwt_secret:    {}", set_or_unset(config.jwt_secret.is_some()));
            println!("  polka_api_key: {}", set_or_unset(config.polka_api_key.is_some()));
            println!("  password_cost: {}", config.password_cost);
            println!(
                "  log_file:      {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
///
/// Edits the file as written; `CHIRPY_*` environment overrides are not
/// folded into it.
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);

    let mut config =
        Config::load_file_only(&save_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if is_secret(&key) { "(hidden)" } else { value.as_str() };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "jwt_secret" => {
            config.jwt_secret = optional(value);
        }
        "polka_api_key" => {
            config.polka_api_key = optional(value);
        }
        "password_cost" => {
            config.password_cost = value
                .parse()
                .context("Invalid value for password_cost. Use a number between 4 and 31.")?;
            config.validate()?;
        }
        "log_file" => {
            config.log_file = optional(value).map(PathBuf::from);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, jwt_secret, polka_api_key, password_cost, log_file",
                key
            );
        }
    }
    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn is_secret(key: &str) -> bool {
    matches!(key, "jwt_secret" | "polka_api_key")
}

fn set_or_unset(set: bool) -> &'static str {
    if set {
        "(set)"
    } else {
        "(not set)"
    }
}
