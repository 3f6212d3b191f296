//! Server configuration
//!
//! Sources are merged in order, later ones winning:
//! 1. `AppConfig::default()`
//! 2. TOML file (`--config <path>`, else `medrec.toml` in the working directory)
//! 3. Environment variables prefixed `MEDREC_`, nested with `__`
//!    (e.g. `MEDREC_AUTH__JWT_SECRET`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILENAME: &str = "medrec.toml";
pub const CONFIG_ENV_PREFIX: &str = "MEDREC_";
const MIN_SECRET_BYTES: usize = 32;
/// Thirty days.
const MAX_TOKEN_TTL_MINUTES: u64 = 30 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to extract configuration: {0}")]
    Extract(#[from] figment::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            cors_origins: vec!["http://localhost:3000".into()],
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("medrec.db"),
        }
    }
}

/// Account provisioned at start-up with the ADMIN role.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret, at least 32 bytes
    pub jwt_secret: String,
    pub token_ttl_minutes: u64,
    pub bcrypt_cost: u32,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_minutes: 30,
            bcrypt_cost: 12,
            bootstrap_admin: None,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub lab_results_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lab_results_dir: PathBuf::from("lab_results"),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

/// Configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load and validate configuration from all sources.
    pub fn load(&self) -> ConfigResult<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        match &self.config_path {
            Some(path) if path.exists() => {
                figment = figment.merge(Toml::file(path));
                info!(path = %path.display(), "configuration file loaded");
            }
            Some(path) => {
                return Err(ConfigError::Invalid(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    figment = figment.merge(Toml::file(&default_path));
                    info!(path = %default_path.display(), "configuration file loaded");
                } else {
                    warn!("no {DEFAULT_CONFIG_FILENAME} found, using defaults and environment");
                }
            }
        }

        figment = figment.merge(Env::prefixed(&self.env_prefix).split("__"));

        let config: AppConfig = figment.extract()?;
        validate_app_config(&config)?;
        Ok(config)
    }
}

/// Reject configurations the server cannot start with.
pub fn validate_app_config(config: &AppConfig) -> ConfigResult<()> {
    if config.auth.jwt_secret.len() < MIN_SECRET_BYTES {
        return Err(ConfigError::Invalid(format!(
            "auth.jwt_secret must be at least {MIN_SECRET_BYTES} bytes"
        )));
    }
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&config.auth.token_ttl_minutes) {
        return Err(ConfigError::Invalid(format!(
            "auth.token_ttl_minutes must be between 1 and {MAX_TOKEN_TTL_MINUTES}"
        )));
    }
    if !(4..=31).contains(&config.auth.bcrypt_cost) {
        return Err(ConfigError::Invalid(
            "auth.bcrypt_cost must be between 4 and 31".into(),
        ));
    }
    if config.server.port == 0 {
        return Err(ConfigError::Invalid("server.port must be positive".into()));
    }
    if config.storage.max_upload_bytes == 0 {
        return Err(ConfigError::Invalid(
            "storage.max_upload_bytes must be positive".into(),
        ));
    }
    if let Some(admin) = &config.auth.bootstrap_admin {
        if medrec_core::models::normalize_email(&admin.email).is_none() {
            return Err(ConfigError::Invalid(
                "auth.bootstrap_admin.email is not a valid email".into(),
            ));
        }
        if admin.password.is_empty() {
            return Err(ConfigError::Invalid(
                "auth.bootstrap_admin.password must not be empty".into(),
            ));
        }
    }
    Ok(())
}
