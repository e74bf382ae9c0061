//! Response builders, body parsing and auth helpers shared by the routes

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::{body::Incoming, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{extract_token_from_header, is_operation_allowed, Claims, Operation};
use crate::server::AppState;
use crate::types::GatewayError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest JSON body accepted from clients
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

pub fn error_response(status: StatusCode, error: impl Into<String>, code: Option<&str>) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: error.into(),
            code: code.map(str::to_string),
        },
    )
}

pub fn empty_response(status: StatusCode) -> Response<BoxBody> {
    Response::builder()
        .status(status)
        .header("Access-Control-Allow-Origin", "*")
        .body(empty_body())
        .unwrap()
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    error_response(StatusCode::NOT_FOUND, format!("Not Found: {}", path), None)
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// Read and decode a JSON body, refusing to buffer more than `MAX_BODY_BYTES`
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<Incoming>,
) -> Result<T, GatewayError> {
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                GatewayError::Http("Request body too large".into())
            } else {
                GatewayError::Http(format!("Failed to read body: {}", e))
            }
        })?;

    serde_json::from_slice(&body.to_bytes())
        .map_err(|e| GatewayError::Http(format!("Invalid JSON: {}", e)))
}

fn get_auth_header(req: &Request<Incoming>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Verify the caller's token and permission for `operation`
pub fn authorize(
    req: &Request<Incoming>,
    state: &AppState,
    operation: Operation,
) -> Result<Claims, Response<BoxBody>> {
    let jwt = state.jwt.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::NOT_IMPLEMENTED,
            "Authentication not enabled (missing JWT_SECRET)",
            Some("NOT_ENABLED"),
        )
    })?;

    let token = extract_token_from_header(get_auth_header(req)).ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "No token provided", Some("NO_TOKEN"))
    })?;

    let result = jwt.verify_token(token);
    let claims = match (result.valid, result.claims) {
        (true, Some(claims)) => claims,
        _ => {
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                result.error.unwrap_or_else(|| "Invalid or expired token".into()),
                Some("INVALID_TOKEN"),
            ))
        }
    };

    if !is_operation_allowed(operation, claims.role) {
        warn!(username = %claims.username, role = %claims.role, ?operation, "Operation forbidden");
        return Err(error_response(
            StatusCode::FORBIDDEN,
            format!("Role {} may not perform this operation", claims.role),
            Some("FORBIDDEN"),
        ));
    }

    Ok(claims)
}
