//! Chirpy CLI
//!
//! Command-line interface for Chirpy - users, sessions and chirps.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use chirpy_core::{ChirpId, Chirpy, Config, UserId};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "chirpy")]
#[command(about = "Chirpy - micro-blogging backend")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging; also wipes the database before running the command
    #[arg(long, global = true)]
    debug: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Log in and receive an access and a refresh token
    Login {
        email: String,
        password: String,
        /// Access token lifetime in seconds (at most one hour)
        #[arg(long)]
        expires_in: Option<i64>,
    },
    /// Refresh or revoke refresh tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
    /// Manage chirps
    Chirp {
        #[command(subcommand)]
        command: ChirpCommands,
    },
    /// Deliver webhook events
    Webhook {
        #[command(subcommand)]
        command: WebhookCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show database status
    Status,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    #[command(alias = "signup")]
    Create { email: String, password: String },
    /// Show a user by email
    Show { email: String },
    /// Change the logged-in user's email and password
    Update {
        /// Access token (or "Bearer <token>")
        #[arg(long)]
        token: String,
        email: String,
        password: String,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Get a new access token for a refresh token
    Refresh { refresh_token: String },
    /// Revoke a refresh token
    Revoke { refresh_token: String },
}

#[derive(Subcommand)]
enum ChirpCommands {
    /// Post a chirp
    #[command(alias = "add")]
    Post {
        /// Access token (or "Bearer <token>")
        #[arg(long)]
        token: String,
        body: String,
    },
    /// List chirps
    #[command(alias = "ls")]
    List {
        /// Only chirps by this user id
        #[arg(long)]
        author_id: Option<UserId>,
        /// Sort order by id: asc or desc
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show a chirp
    Show { id: ChirpId },
    /// Delete one of your chirps
    #[command(alias = "rm")]
    Delete {
        /// Access token (or "Bearer <token>")
        #[arg(long)]
        token: String,
        id: ChirpId,
    },
}

#[derive(Subcommand)]
enum WebhookCommands {
    /// Deliver a Polka billing event
    Polka {
        /// Authorization header value, "ApiKey <key>"
        #[arg(long)]
        authorization: String,
        /// Event name, e.g. user.upgraded
        event: String,
        user_id: UserId,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, jwt_secret, polka_api_key, password_cost, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let result = run(Cli::parse());
    if let Err(err) = &result {
        if let Some(hint) = recovery_hint(err) {
            eprintln!("Hint: {}", hint);
        }
    }
    result
}

fn run(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config, cli.debug);

    let chirpy = Chirpy::open(config).context("Failed to open database")?;

    if cli.debug {
        chirpy.reset().context("Failed to reset database")?;
        warn!(path = %chirpy.store().path().display(), "Debug mode: database wiped");
    }

    match cli.command {
        Commands::User { command } => handle_user_command(command, &chirpy, &output),
        Commands::Login {
            email,
            password,
            expires_in,
        } => commands::user::login(&chirpy, email, password, expires_in, &output),
        Commands::Token { command } => handle_token_command(command, &chirpy, &output),
        Commands::Chirp { command } => handle_chirp_command(command, &chirpy, &output),
        Commands::Webhook { command } => handle_webhook_command(command, &chirpy, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Status => commands::status::show(&chirpy, &output),
    }
}

fn handle_user_command(command: UserCommands, chirpy: &Chirpy, output: &Output) -> Result<()> {
    match command {
        UserCommands::Create { email, password } => {
            commands::user::create(chirpy, email, password, output)
        }
        UserCommands::Show { email } => commands::user::show(chirpy, email, output),
        UserCommands::Update {
            token,
            email,
            password,
        } => commands::user::update(chirpy, token, email, password, output),
    }
}

fn handle_token_command(command: TokenCommands, chirpy: &Chirpy, output: &Output) -> Result<()> {
    match command {
        TokenCommands::Refresh { refresh_token } => {
            commands::token::refresh(chirpy, refresh_token, output)
        }
        TokenCommands::Revoke { refresh_token } => {
            commands::token::revoke(chirpy, refresh_token, output)
        }
    }
}

fn handle_chirp_command(command: ChirpCommands, chirpy: &Chirpy, output: &Output) -> Result<()> {
    match command {
        ChirpCommands::Post { token, body } => commands::chirp::post(chirpy, token, body, output),
        ChirpCommands::List { author_id, sort } => {
            commands::chirp::list(chirpy, author_id, sort, output)
        }
        ChirpCommands::Show { id } => commands::chirp::show(chirpy, id, output),
        ChirpCommands::Delete { token, id } => commands::chirp::delete(chirpy, token, id, output),
    }
}

fn handle_webhook_command(
    command: WebhookCommands,
    chirpy: &Chirpy,
    output: &Output,
) -> Result<()> {
    match command {
        WebhookCommands::Polka {
            authorization,
            event,
            user_id,
        } => commands::webhook::polka(chirpy, authorization, event, user_id, output),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Recovery suggestion for storage failures anywhere in the error chain
fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| match cause.downcast_ref::<chirpy_core::Error>() {
        Some(chirpy_core::Error::Storage(storage)) => storage.recovery_suggestion(),
        _ => None,
    })
}

/// Initialize logging
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--debug`.
/// Logs go to `config.log_file` when configured, stderr otherwise.
fn init_logging(config: &Config, debug_mode: bool) {
    let level = if debug_mode { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chirpy_core={},chirpy_cli={}", level, level)));

    if let Some(log_path) = &config.log_file {
        match File::options().create(true).append(true).open(log_path) {
            Ok(log_file) => {
                // Ignore error if already initialized
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(log_file))
                    .try_init();
                debug!("Logging to {:?}", log_path);
                return;
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
