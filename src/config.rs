//! Configuration for pharmagate
//!
//! CLI arguments and environment variable handling using clap. Everything the
//! registry client and the safety check need is copied out of `Args` once at
//! startup into `RegistryConfig` / `SafetyConfig` and injected from there.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::jwt::DEV_SECRET;

/// Default settling delay before an encounter is queried for interactions
pub const DEFAULT_SETTLE_MS: u64 = 1500;

/// pharmagate - hospital staff gateway with drug-interaction safety checks
#[derive(Parser, Debug, Clone)]
#[command(name = "pharmagate")]
#[command(about = "Hospital staff gateway for the clinical registry")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Base URL of the clinical registry API (no trailing slash needed)
    #[arg(long, env = "REGISTRY_BASE_URL", default_value = "")]
    pub registry_base_url: String,

    /// API key sent to the registry as `Authorization: Token <key>`
    #[arg(long, env = "REGISTRY_API_KEY")]
    pub registry_api_key: Option<String>,

    /// Registry request timeout in milliseconds
    #[arg(long, env = "REGISTRY_TIMEOUT_MS", default_value = "10000")]
    pub registry_timeout_ms: u64,

    /// Delay before querying a freshly created encounter for interactions.
    /// The registry analyses interactions asynchronously; this is a
    /// heuristic wait, not a completion guarantee.
    #[arg(long, env = "SAFETY_SETTLE_MS", default_value_t = DEFAULT_SETTLE_MS)]
    pub safety_settle_ms: u64,

    /// Enable development mode (in-memory audit store, relaxed login)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "pharmagate")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text or json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

/// Connection settings for the clinical registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Tunables for the post-encounter safety check
#[derive(Debug, Clone)]
pub struct SafetyConfig {
    pub settle_delay: Duration,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_MS),
        }
    }
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> Option<String> {
        match &self.jwt_secret {
            Some(secret) => Some(secret.clone()),
            None if self.dev_mode => Some(DEV_SECRET.to_string()),
            None => None,
        }
    }

    /// Registry connection settings
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            base_url: self.registry_base_url.trim_end_matches('/').to_string(),
            api_key: self.registry_api_key.clone().unwrap_or_default(),
            timeout: Duration::from_millis(self.registry_timeout_ms),
        }
    }

    /// Safety check settings
    pub fn safety_config(&self) -> SafetyConfig {
        SafetyConfig {
            settle_delay: Duration::from_millis(self.safety_settle_ms),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.registry_base_url.trim().is_empty() {
            return Err("REGISTRY_BASE_URL is required".to_string());
        }

        if !self.dev_mode {
            if self.jwt_secret.is_none() {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            if self.registry_api_key.is_none() {
                return Err("REGISTRY_API_KEY is required in production mode".to_string());
            }
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(format!("Unknown LOG_FORMAT '{}'", self.log_format));
        }

        Ok(())
    }
}
