//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/chirpy/config.toml)
//! 3. Environment variables (CHIRPY_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::validate_cost;

/// Environment variable prefix
const ENV_PREFIX: &str = "CHIRPY";

/// Name of the database file inside `data_dir`
pub const DATABASE_FILE: &str = "database.json";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the database file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Secret used to sign access tokens
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Key the billing provider presents on webhook calls
    #[serde(default)]
    pub polka_api_key: Option<String>,

    /// bcrypt work factor for new password hashes
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,

    /// Write logs here instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            jwt_secret: None,
            polka_api_key: None,
            password_cost: default_password_cost(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (CHIRPY_DATA_DIR, CHIRPY_JWT_SECRET, ...)
    /// 2. Config file (~/.config/chirpy/config.toml or CHIRPY_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;

        config.apply_env_overrides()?;
        config.validate()?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load only what the config file says, without environment overrides
    ///
    /// Use this when the result is written back to the file, so values that
    /// only live in the environment stay out of it.
    pub fn load_file_only(path: &Path) -> Result<Self> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the file at `path`, or use defaults if it doesn't exist
    fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Check values that would otherwise only fail on first use
    pub fn validate(&self) -> crate::error::Result<()> {
        validate_cost(self.password_cost)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // CHIRPY_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // CHIRPY_JWT_SECRET
        if let Ok(val) = std::env::var(format!("{}_JWT_SECRET", ENV_PREFIX)) {
            self.jwt_secret = non_empty(val);
        }

        // CHIRPY_POLKA_API_KEY
        if let Ok(val) = std::env::var(format!("{}_POLKA_API_KEY", ENV_PREFIX)) {
            self.polka_api_key = non_empty(val);
        }

        // CHIRPY_LOG_FILE
        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = non_empty(val).map(PathBuf::from);
        }

        // CHIRPY_PASSWORD_COST
        if let Ok(val) = std::env::var(format!("{}_PASSWORD_COST", ENV_PREFIX)) {
            self.password_cost = val
                .parse()
                .with_context(|| format!("Invalid {}_PASSWORD_COST: {:?}", ENV_PREFIX, val))?;
        }

        Ok(())
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with CHIRPY_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chirpy")
            .join("config.toml")
    }

    /// Get the path to the database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn non_empty(val: String) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chirpy")
}

fn default_password_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "CHIRPY_DATA_DIR",
        "CHIRPY_JWT_SECRET",
        "CHIRPY_POLKA_API_KEY",
        "CHIRPY_LOG_FILE",
        "CHIRPY_PASSWORD_COST",
        "CHIRPY_CONFIG",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.jwt_secret.is_none());
        assert!(config.polka_api_key.is_none());
        assert_eq!(config.password_cost, bcrypt::DEFAULT_COST);
        assert!(config.data_dir.ends_with("chirpy"));
    }

    #[test]
    fn test_database_path() {
        let config = Config {
            data_dir: PathBuf::from("/srv/chirpy"),
            ..Config::default()
        };
        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/chirpy/database.json")
        );
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("CHIRPY_DATA_DIR", "/tmp/chirpy-test");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/chirpy-test"));
    }

    #[test]
    fn test_env_override_secrets() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("CHIRPY_JWT_SECRET", "s3cret");
        env::set_var("CHIRPY_POLKA_API_KEY", "f271c81ff7084ee5b99a5091b42d486e");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(
            config.polka_api_key.as_deref(),
            Some("f271c81ff7084ee5b99a5091b42d486e")
        );

        // Empty string clears it
        env::set_var("CHIRPY_JWT_SECRET", "");
        config.apply_env_overrides().unwrap();
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn test_env_override_password_cost() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("CHIRPY_PASSWORD_COST", "4");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.password_cost, 4);

        env::set_var("CHIRPY_PASSWORD_COST", "lots");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/chirpy"),
            jwt_secret: Some("s3cret".to_string()),
            polka_api_key: None,
            password_cost: 6,
            log_file: Some(PathBuf::from("/var/log/chirpy.log")),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("jwt_secret"));
        assert!(toml_str.contains("password_cost"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.jwt_secret, config.jwt_secret);
        assert_eq!(parsed.password_cost, 6);
        assert_eq!(parsed.log_file, config.log_file);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            jwt_secret = "from-file"
            polka_api_key = "key"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.jwt_secret.as_deref(), Some("from-file"));
        assert_eq!(config.polka_api_key.as_deref(), Some("key"));
        assert_eq!(config.password_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_env_beats_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        env::set_var("CHIRPY_JWT_SECRET", "from-env");
        let config = Config::load_from_str(r#"jwt_secret = "from-file""#).unwrap();
        assert_eq!(config.jwt_secret.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        env::set_var("CHIRPY_DATA_DIR", &data_dir);

        let config = Config::load_from_path(&temp_dir.path().join("missing.toml")).unwrap();
        // Defaults when the file doesn't exist, and the data dir is created
        assert!(config.jwt_secret.is_none());
        assert!(data_dir.is_dir());
    }

    #[test]
    fn test_load_file_only_ignores_env() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "polka_api_key = \"from-file\"\n").unwrap();

        env::set_var("CHIRPY_JWT_SECRET", "from-env-only");
        env::set_var("CHIRPY_POLKA_API_KEY", "env-key");
        env::set_var("CHIRPY_DATA_DIR", temp_dir.path().join("env-data"));

        let config = Config::load_file_only(&path).unwrap();
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.polka_api_key.as_deref(), Some("from-file"));
        assert_ne!(config.data_dir, temp_dir.path().join("env-data"));
        assert!(!temp_dir.path().join("env-data").exists());

        // A missing file gives plain defaults
        let missing = Config::load_file_only(&temp_dir.path().join("missing.toml")).unwrap();
        assert!(missing.jwt_secret.is_none());
    }

    #[test]
    fn test_password_cost_out_of_range_rejected() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();

        assert!(Config::load_from_str("password_cost = 3").is_err());
        assert!(Config::load_from_str("password_cost = 32").is_err());
        assert_eq!(Config::load_from_str("password_cost = 4").unwrap().password_cost, 4);

        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "password_cost = 99\n").unwrap();
        assert!(Config::load_file_only(&path).is_err());

        env::set_var("CHIRPY_DATA_DIR", temp_dir.path().join("data"));
        env::set_var("CHIRPY_PASSWORD_COST", "0");
        assert!(Config::load_from_path(&temp_dir.path().join("missing.toml")).is_err());

        let config = Config {
            password_cost: 40,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(crate::error::Error::Configuration(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            jwt_secret: Some("s3cret".to_string()),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert_eq!(loaded.jwt_secret.as_deref(), Some("s3cret"));
    }
}
