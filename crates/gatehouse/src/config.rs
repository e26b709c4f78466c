//! Configuration loading and management
//!
//! Values are layered: built-in defaults, then the optional TOML file,
//! then environment variables and command-line flags.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    /// Session token lifetime: short while developing, a week elsewhere
    pub fn token_ttl(&self) -> chrono::Duration {
        match self {
            Environment::Development => chrono::Duration::hours(1),
            _ => chrono::Duration::days(7),
        }
    }

    /// Log level used when neither `RUST_LOG` nor `logging.level` is set
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Environment::Development => "debug",
            Environment::Test => "warn",
            Environment::Staging | Environment::Production => "info",
        }
    }

    /// Production ships machine-readable logs
    pub fn json_logs(&self) -> bool {
        matches!(self, Environment::Production)
    }

    fn tolerates_default_secret(&self) -> bool {
        matches!(self, Environment::Development | Environment::Test)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => bail!(
                "Unknown environment '{}' (expected development, staging, production or test)",
                other
            ),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    /// Administrator created at startup when no user has this email
    pub admin: Option<AdminConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./data/gatehouse.db?mode=rwc".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn pool_settings(&self) -> gatehouse_db::PoolSettings {
        gatehouse_db::PoolSettings {
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        }
    }

    /// Directory that must exist before a file-backed SQLite URL can open
    pub fn sqlite_data_dir(&self) -> Option<PathBuf> {
        let rest = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        let path = rest.split('?').next()?;
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }
        Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            host: "localhost".to_string(),
            port: 6379,
            timeout_ms: 2000,
        }
    }
}

impl CacheConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub probe_timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 2000,
        }
    }
}

impl HealthConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Logging configuration; unset fields follow the environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// "pretty" or "json"
    pub format: Option<String>,
}

/// Metrics configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

/// Bootstrap administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub name: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

/// Values taken from the process environment or command line
///
/// Each field wins over the file when set.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cache_host: Option<String>,
    pub cache_port: Option<u16>,
    pub jwt_secret: Option<String>,
    pub environment: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file; a missing file means defaults
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!("Config file not found at {}, using defaults", path);
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::new(path, ::config::FileFormat::Toml).required(false))
            .build()
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Apply environment and command-line values on top of the file
    pub fn apply_overrides(&mut self, overrides: Overrides) -> Result<()> {
        if let Some(env) = overrides.environment {
            self.environment = env.parse()?;
        }
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(host) = overrides.cache_host {
            self.cache.host = host;
        }
        if let Some(port) = overrides.cache_port {
            self.cache.port = port;
        }
        if let Some(secret) = overrides.jwt_secret {
            self.auth.jwt_secret = secret;
        }
        Ok(())
    }

    /// Effective log level
    pub fn log_level(&self) -> &str {
        self.logging
            .level
            .as_deref()
            .unwrap_or_else(|| self.environment.default_log_level())
    }

    /// Whether logs are emitted as JSON
    pub fn json_logs(&self) -> bool {
        match self.logging.format.as_deref() {
            Some(format) => format.eq_ignore_ascii_case("json"),
            None => self.environment.json_logs(),
        }
    }

    /// Log warnings for settings that are unsafe outside development
    pub fn warn_on_insecure_defaults(&self) {
        if self.auth.jwt_secret == DEFAULT_JWT_SECRET && !self.environment.tolerates_default_secret()
        {
            warn!(
                "JWT_SECRET is not set; tokens in {} are signed with the built-in default secret",
                self.environment
            );
        }
    }
}
