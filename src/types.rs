//! Shared error and result types for pharmagate

use thiserror::Error;

use crate::registry::RegistryError;
use crate::safety::AuditError;

/// Top-level error for the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
