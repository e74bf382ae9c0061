//! HTTP Routes for staff authentication
//!
//! - POST /api/login - Authenticate and get a JWT
//! - GET  /api/me    - Current staff member from token

use bson::doc;
use hyper::{body::Incoming, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{verify_password, Operation, StaffRole, TokenInput};
use crate::routes::common::{authorize, error_response, json_response, parse_json_body, BoxBody};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: StaffRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub username: String,
    pub role: StaffRole,
    pub expires_at: u64,
}

fn invalid_credentials() -> Response<BoxBody> {
    // Same answer for unknown users and bad passwords
    error_response(StatusCode::BAD_REQUEST, "Invalid Credentials", None)
}

/// POST /api/login
pub async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string(), None),
    };

    if body.username.is_empty() || body.password.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: username, password",
            None,
        );
    }

    let Some(jwt) = state.jwt.as_ref() else {
        return error_response(
            StatusCode::NOT_IMPLEMENTED,
            "Authentication not enabled (missing JWT_SECRET)",
            Some("NOT_ENABLED"),
        );
    };

    let input = match &state.users {
        Some(users) => {
            let user = match users
                .find_one(doc! { "username": body.username.as_str(), "is_active": true })
                .await
            {
                Ok(Some(u)) => u,
                Ok(None) => {
                    warn!("Login failed - unknown user: {}", body.username);
                    return invalid_credentials();
                }
                Err(e) => {
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Database error: {}", e),
                        Some("DB_ERROR"),
                    )
                }
            };

            match verify_password(&body.password, &user.password_hash) {
                Ok(true) => {}
                Ok(false) => {
                    warn!("Login failed - invalid password: {}", body.username);
                    return invalid_credentials();
                }
                Err(e) => {
                    warn!("Password verification error for {}: {}", body.username, e);
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Authentication error",
                        Some("AUTH_ERROR"),
                    );
                }
            }

            TokenInput {
                user_id: user.user_id(),
                username: user.username,
                role: user.role,
            }
        }
        None if state.args.dev_mode => {
            warn!("Dev mode login without user store: {}", body.username);
            TokenInput {
                user_id: format!("dev-{}", body.username),
                username: body.username.clone(),
                role: StaffRole::Doctor,
            }
        }
        None => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Database not available",
                Some("DB_UNAVAILABLE"),
            )
        }
    };

    let username = input.username.clone();
    let role = input.role;
    match jwt.generate_token(input) {
        Ok(token) => {
            info!(username = %username, role = %role, expires_in = jwt.expiry_seconds(), "Staff login");
            json_response(StatusCode::OK, &LoginResponse { token, username, role })
        }
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to generate token: {}", e),
            Some("TOKEN_ERROR"),
        ),
    }
}

/// GET /api/me
pub async fn handle_me(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let claims = match authorize(&req, &state, Operation::ListPatients) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    json_response(
        StatusCode::OK,
        &MeResponse {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
            expires_at: claims.exp,
        },
    )
}
