//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde_json::{json, Value};

use chirpy_core::{Chirp, LoginResponse, StoreStatus, User};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a user (never the password hash)
    pub fn print_user(&self, user: &User) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", user.id);
                println!("Email:       {}", user.email);
                println!("Chirpy Red:  {}", if user.is_chirpy_red { "yes" } else { "no" });
            }
            OutputFormat::Json => println!("{:#}", user_json(user)),
            OutputFormat::Quiet => println!("{}", user.id),
        }
    }

    /// Print the result of a login
    pub fn print_login(&self, login: &LoginResponse) {
        match self.format {
            OutputFormat::Human => {
                self.print_user(&login.user);
                println!();
                println!("Access token:  {}", login.token);
                println!("Refresh token: {}", login.refresh_token);
            }
            OutputFormat::Json => {
                let mut value = user_json(&login.user);
                value["token"] = json!(login.token);
                value["refresh_token"] = json!(login.refresh_token);
                println!("{:#}", value);
            }
            OutputFormat::Quiet => println!("{}", login.token),
        }
    }

    /// Print a freshly issued access token
    pub fn print_access_token(&self, token: &str) {
        match self.format {
            OutputFormat::Human => println!("Access token: {}", token),
            OutputFormat::Json => println!("{:#}", json!({ "token": token })),
            OutputFormat::Quiet => println!("{}", token),
        }
    }

    /// Print a single chirp
    pub fn print_chirp(&self, chirp: &Chirp) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", chirp.id);
                println!("Author:  {}", chirp.author_id);
                println!("Body:    {}", chirp.body);
            }
            OutputFormat::Json => println!("{:#}", chirp_json(chirp)),
            OutputFormat::Quiet => println!("{}", chirp.id),
        }
    }

    /// Print a list of chirps
    pub fn print_chirps(&self, chirps: &[Chirp]) {
        match self.format {
            OutputFormat::Human => {
                if chirps.is_empty() {
                    println!("No chirps found.");
                    return;
                }
                for chirp in chirps {
                    println!(
                        "{:>5} | {:>5} | {}",
                        chirp.id,
                        chirp.author_id,
                        truncate(&chirp.body, 60)
                    );
                }
                println!("\n{} chirp(s)", chirps.len());
            }
            OutputFormat::Json => {
                let list: Vec<Value> = chirps.iter().map(chirp_json).collect();
                println!("{:#}", Value::Array(list));
            }
            OutputFormat::Quiet => {
                for chirp in chirps {
                    println!("{}", chirp.id);
                }
            }
        }
    }

    /// Print database status
    pub fn print_status(&self, status: &StoreStatus) {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{:#}",
                    json!({
                        "database_path": status.database_path,
                        "file_size": status.file_size,
                        "counts": {
                            "chirps": status.chirps,
                            "users": status.users,
                            "refresh_tokens": status.refresh_tokens
                        }
                    })
                );
            }
            OutputFormat::Quiet => println!("{}", status.database_path.display()),
            OutputFormat::Human => {
                println!("Chirpy Status");
                println!("=============");
                println!();
                println!("Storage:");
                println!("  Location: {}", status.database_path.display());
                println!("  Size:     {}", human_size(status.file_size));
                println!();
                println!("Contents:");
                println!("  Chirps:         {}", status.chirps);
                println!("  Users:          {}", status.users);
                println!("  Refresh tokens: {}", status.refresh_tokens);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!("{}", json!({"status": "success", "message": message}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn user_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "is_chirpy_red": user.is_chirpy_red
    })
}

fn chirp_json(chirp: &Chirp) -> Value {
    json!({
        "id": chirp.id,
        "body": chirp.body,
        "author_id": chirp.author_id
    })
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a byte count for humans
fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
