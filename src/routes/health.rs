//! GET /health - liveness

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::common::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub mode: &'static str,
    pub audit_store: &'static str,
    pub user_store: bool,
}

pub fn handle_health(state: &AppState) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            mode: if state.args.dev_mode { "development" } else { "production" },
            audit_store: state.safety.recorder().store().backend(),
            user_store: state.users.is_some(),
        },
    )
}
