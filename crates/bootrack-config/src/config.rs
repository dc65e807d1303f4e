//! Configuration types and loading.
//!
//! [`BootrackConfig`] mirrors `.bootrack/config.yaml`. [`load_config`] layers
//! built-in defaults, the YAML file, and `BOOTRACK_*` environment variables
//! (nested keys separated by `__`, e.g. `BOOTRACK_SERVER__PORT=9000`).

use std::path::{Path, PathBuf};

use bootrack_core::query::DEFAULT_RANK_CUTOFF;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name inside the `.bootrack/` directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "BOOTRACK_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration could not be serialized as YAML.
    #[error("failed to encode config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Merging the layered sources failed (bad YAML, wrong type in an env var).
    #[error("failed to load configuration: {0}")]
    Extract(#[from] figment::Error),

    /// The `.bootrack/` directory was not found.
    #[error("no .bootrack directory found (run 'bt init' first)")]
    BootrackDirNotFound,

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The offending key, dotted.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Database file. Relative paths resolve against the `.bootrack/`
    /// directory; unset means `bootrack.db` there.
    #[serde(default)]
    pub path: Option<String>,
}

/// HTTP server settings for `bt serve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Worker threads; unset lets actix pick one per core.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Query tuning shared by the store and the client loaders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Issues kept per priority group when ranking.
    #[serde(default = "default_rank_cutoff", rename = "rank-cutoff")]
    pub rank_cutoff: u32,

    /// Keep locations in list summaries.
    #[serde(default, rename = "summary-includes-location")]
    pub summary_includes_location: bool,

    #[serde(default = "default_page_size", rename = "page-size")]
    pub page_size: u32,

    /// Size of each cursor batch during prefetch.
    #[serde(default = "default_page_size", rename = "batch-size")]
    pub batch_size: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            rank_cutoff: default_rank_cutoff(),
            summary_includes_location: false,
            page_size: default_page_size(),
            batch_size: default_page_size(),
        }
    }
}

fn default_rank_cutoff() -> u32 {
    DEFAULT_RANK_CUTOFF
}

fn default_page_size() -> u32 {
    10
}

/// Remote server used by client-mode commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url", rename = "base-url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Username acting on behalf of the CLI when `--as-user` is absent.
    #[serde(default)]
    pub user: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user: None,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full bootrack configuration.
///
/// Every field has a serde default, so partial YAML files are fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BootrackConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl BootrackConfig {
    /// Resolved database path for a config found in `bootrack_dir`.
    pub fn database_path(&self, bootrack_dir: &Path) -> PathBuf {
        match &self.database.path {
            Some(path) if Path::new(path).is_absolute() => PathBuf::from(path),
            Some(path) => bootrack_dir.join(path),
            None => bootrack_dir.join("bootrack.db"),
        }
    }

    /// `bind:port` for the HTTP listener.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    /// Rejects values no component can work with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("query.rank-cutoff", self.query.rank_cutoff),
            ("query.page-size", self.query.page_size),
            ("query.batch-size", self.query.batch_size),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(invalid(key, "must be at least 1"));
            }
        }
        if self.server.workers == Some(0) {
            return Err(invalid("server.workers", "must be at least 1"));
        }
        if !self.client.base_url.starts_with("http://") && !self.client.base_url.starts_with("https://") {
            return Err(invalid("client.base-url", "must be an http(s) URL"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The layered provider stack for a `.bootrack/` directory.
pub fn figment(bootrack_dir: &Path) -> Figment {
    Figment::from(Serialized::defaults(BootrackConfig::default()))
        .merge(Yaml::file(bootrack_dir.join(CONFIG_FILE_NAME)))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Loads and validates configuration for the given `.bootrack/` directory.
///
/// A missing or empty `config.yaml` yields the defaults (plus env overrides).
pub fn load_config(bootrack_dir: &Path) -> Result<BootrackConfig> {
    let config: BootrackConfig = figment(bootrack_dir).extract()?;
    config.validate()?;
    Ok(config)
}

/// Writes `config.yaml` into `bootrack_dir`, creating the directory.
pub fn save_config(bootrack_dir: &Path, config: &BootrackConfig) -> Result<()> {
    std::fs::create_dir_all(bootrack_dir)?;
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(bootrack_dir.join(CONFIG_FILE_NAME), yaml)?;
    Ok(())
}
