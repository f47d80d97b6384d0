//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_INTERNAL_URL` or `DATABASE_URL` - `PostgreSQL` connection
//!   string; the internal (private networking) variant wins when both are
//!   set. Absence of both is a fatal startup condition.
//! - `SHOPIFY_WEBHOOK_SECRET` - Shared secret for webhook HMAC verification
//!
//! ## Optional
//! - `FOLIO_HOST` - Bind address (default: 0.0.0.0)
//! - `FOLIO_PORT` - Listen port (default: 8080)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Application configuration.
///
/// Constructed once at process start and carried inside the shared state;
/// nothing reads the environment after startup.
#[derive(Clone)]
pub struct AppConfig {
    /// `PostgreSQL` connection URL (contains password).
    pub database_url: SecretString,
    /// Shared secret for Shopify webhook signatures.
    pub webhook_secret: SecretString,
    /// IP address to bind the server to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL or webhook secret is
    /// missing, or if host/port fail to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url()?;
        let webhook_secret = SecretString::from(get_required_env("SHOPIFY_WEBHOOK_SECRET")?);
        let host = get_env_or_default("FOLIO_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("FOLIO_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("FOLIO_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("FOLIO_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            database_url,
            webhook_secret,
            host,
            port,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Load only the database URL, for tools that never see webhooks.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` when neither variable is set.
    pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
        let _ = dotenvy::dotenv();
        get_database_url()
    }
}

/// Get the database URL, preferring the internal/private-networking URL.
fn get_database_url() -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var("DATABASE_INTERNAL_URL") {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(
        "DATABASE_INTERNAL_URL".to_string(),
    ))
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
