//! JWT token issue and validation for staff sessions

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::roles::StaffRole;
use crate::types::GatewayError;

/// Signing secret used when dev mode runs without `JWT_SECRET`
pub const DEV_SECRET: &str = "dev-only-insecure-secret";

/// Claims carried by a staff token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Staff user id
    pub sub: String,
    pub username: String,
    pub role: StaffRole,
    pub iat: u64,
    pub exp: u64,
}

/// Input for token generation
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub user_id: String,
    pub username: String,
    pub role: StaffRole,
}

/// Result of token verification
#[derive(Debug, Clone)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

/// Issues and verifies HS256 tokens
#[derive(Clone)]
pub struct JwtValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_seconds: u64,
}

impl JwtValidator {
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, GatewayError> {
        if secret.is_empty() {
            return Err(GatewayError::Config("JWT secret must not be empty".into()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        })
    }

    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    pub fn generate_token(&self, input: TokenInput) -> Result<String, GatewayError> {
        let now = unix_now();
        let claims = Claims {
            sub: input.user_id,
            username: input.username,
            role: input.role,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| GatewayError::Auth(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> TokenValidationResult {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => TokenValidationResult {
                valid: true,
                claims: Some(data.claims),
                error: None,
            },
            Err(e) => TokenValidationResult {
                valid: false,
                claims: None,
                error: Some(format!("Invalid token: {}", e)),
            },
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Extract the token from an `Authorization` header.
///
/// Accepts `Bearer <token>` and the registry-style `Token <token>`.
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    let header = header?.trim();
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("Token "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
