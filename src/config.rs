//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    /// Accounts created at startup
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "login.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://login.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
    /// How often expired sessions are purged, in seconds
    pub purge_interval_seconds: u64,
}

/// A credential bootstrapped into the user table at startup
#[derive(Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> String {
        format!("sessiongate={},tower_http=debug", self.level.to_ascii_lowercase())
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (SESSIONGATE__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        let app_config = Self::load_unchecked()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Load configuration without validating it
    ///
    /// Lets the binary set up logging from `[logging]` before
    /// `validate` reports anything.
    pub fn load_unchecked() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .set_default("server.request_timeout_seconds", 30)?
            .set_default("database.path", "data/sessiongate.db")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("auth.purge_interval_seconds", 3600)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("SESSIONGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(crate::error::AppError::Config(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }

        if !self.logging.is_json() && !self.logging.format.eq_ignore_ascii_case("pretty") {
            return Err(crate::error::AppError::Config(
                "logging.format must be \"pretty\" or \"json\"".to_string(),
            ));
        }

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.auth.purge_interval_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "auth.purge_interval_seconds must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if user.username.trim().is_empty() {
                return Err(crate::error::AppError::Config(
                    "users[].username must not be empty".to_string(),
                ));
            }
            if user.password.is_empty() {
                return Err(crate::error::AppError::Config(format!(
                    "users[].password must not be empty (user {})",
                    user.username
                )));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(crate::error::AppError::Config(format!(
                    "duplicate seed user: {}",
                    user.username
                )));
            }
        }

        if self.users.is_empty() {
            tracing::warn!("No seed users configured; nobody will be able to log in");
        }

        if !self.should_use_secure_cookies() {
            let host = normalized_server_host(&self.server.domain);
            tracing::warn!(
                host = %host,
                protocol = %self.server.protocol,
                "Using insecure session cookies for local development"
            );
        } else if !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(crate::error::AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
