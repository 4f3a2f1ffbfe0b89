//! Configuration for the Beverage Distribution Manager
//!
//! Values are layered, later sources winning:
//! 1. Defaults set in [`Config::load`]
//! 2. `config/<environment>.toml`
//! 3. `BDM__SECTION__KEY` environment variables (`.env` is read first by `main`)

use config::{ConfigError, Environment, File};
use serde::Deserialize;

const DEVELOPMENT: &str = "development";

/// Shortest JWT secret accepted outside development
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// `development`, `production`, ...; selects the config file
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub feed: FeedConfig,
    /// First administrator, created when the users table is empty
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a free pool connection
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// HS256 signing key
    pub secret: String,

    /// Access token lifetime in seconds
    pub access_token_expiry: i64,

    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: i64,
}

/// Live change feed
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Events buffered per subscriber before it must resync
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("BDM_ENVIRONMENT").unwrap_or_else(|_| DEVELOPMENT.into());

        let config: Config = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default("feed.capacity", 256)?
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(
                Environment::with_prefix("BDM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == DEVELOPMENT
    }

    /// Reject settings the server cannot run safely with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Message("jwt.secret must be set".into()));
        }
        if !self.is_development() && self.jwt.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} characters outside development",
                MIN_SECRET_LEN
            )));
        }
        if self.jwt.access_token_expiry <= 0 || self.jwt.refresh_token_expiry <= 0 {
            return Err(ConfigError::Message("token expiries must be positive".into()));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Message(
                "database.min_connections exceeds database.max_connections".into(),
            ));
        }
        if self.feed.capacity == 0 {
            return Err(ConfigError::Message("feed.capacity must be at least 1".into()));
        }
        Ok(())
    }
}
