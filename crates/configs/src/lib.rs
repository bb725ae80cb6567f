//! # configs
//!
//! Layered application configuration: built-in defaults, then an optional
//! TOML file, then `PETBOARD__`-prefixed environment variables
//! (e.g. `PETBOARD__DATABASE__URL`, `PETBOARD__AUTH__JWT_SECRET`).

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "PETBOARD";
pub const DEFAULT_CONFIG_FILE: &str = "config/petboard";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub reconciler: ReconcilerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Leading segment of every object key (`{key_prefix}/board/{post}/{file}`).
    pub key_prefix: String,
    /// Base URL that object keys are appended to for public links.
    pub public_url: String,
    pub local_root: String,
    pub bucket: Option<String>,
    pub region: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub issuer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    pub interval_secs: u64,
    pub grace_secs: i64,
    pub batch_size: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl AppConfig {
    /// Loads `.env`, then defaults, `config/petboard.{toml,...}` if present,
    /// then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load_from(DEFAULT_CONFIG_FILE, Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    pub fn load_from(file: &str, env: Environment) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::builder()?
            .add_source(File::with_name(file).required(false))
            .add_source(env.list_separator(",").with_list_parse_key("server.cors_origins").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.max_upload_bytes", 20 * 1024 * 1024)?
            .set_default("server.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "sqlite:petboard.db")?
            .set_default("database.max_connections", 5)?
            .set_default("storage.backend", "local")?
            .set_default("storage.key_prefix", "petboard")?
            .set_default("storage.public_url", "/static/objects")?
            .set_default("storage.local_root", "./data/objects")?
            .set_default("storage.region", "ap-northeast-2")?
            .set_default("auth.issuer", "petboard")?
            .set_default("reconciler.interval_secs", 60)?
            .set_default("reconciler.grace_secs", 300)?
            .set_default("reconciler.batch_size", 100)?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("server.max_upload_bytes must be positive".into()));
        }
        if self.reconciler.batch_size <= 0 || self.reconciler.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reconciler.batch_size and reconciler.interval_secs must be positive".into(),
            ));
        }
        if self.storage.backend == StorageBackend::S3 && self.storage.bucket.is_none() {
            return Err(ConfigError::Invalid("storage.bucket is required for the s3 backend".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
