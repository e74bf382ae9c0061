//! HTTP Routes for patient records, proxied to the clinical registry
//!
//! - GET    /api/patients/           - Patient list
//! - GET    /api/patients/{id}/file/ - Profile, timeline, medications, tests
//! - DELETE /api/patients/{id}/file/ - Remove a patient

use hyper::{body::Incoming, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::Operation;
use crate::registry::RegistryError;
use crate::routes::common::{authorize, empty_response, error_response, json_response, BoxBody};
use crate::server::AppState;
use crate::services::fetch_patient_file;

/// Patient id from `/api/patients/{id}/file` with or without trailing slash
pub fn parse_patient_file_path(path: &str) -> Option<i64> {
    let rest = path.strip_prefix("/api/patients/")?;
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    let id = rest.strip_suffix("/file")?;
    id.parse().ok()
}

pub(crate) fn registry_unavailable(err: &RegistryError) -> Response<BoxBody> {
    warn!(error = %err, "Registry request failed");
    error_response(
        StatusCode::BAD_GATEWAY,
        format!("Registry unavailable: {}", err),
        Some("REGISTRY_UNAVAILABLE"),
    )
}

/// GET /api/patients/
pub async fn handle_list_patients(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    if let Err(resp) = authorize(&req, &state, Operation::ListPatients) {
        return resp;
    }

    match state.registry.list_patients().await {
        Ok(patients) => json_response(StatusCode::OK, &patients),
        Err(e) => registry_unavailable(&e),
    }
}

/// GET /api/patients/{id}/file/
pub async fn handle_patient_file(
    req: Request<Incoming>,
    state: Arc<AppState>,
    patient_id: i64,
) -> Response<BoxBody> {
    if let Err(resp) = authorize(&req, &state, Operation::ViewPatientFile) {
        return resp;
    }

    match fetch_patient_file(&state.registry, patient_id).await {
        Ok(Some(file)) => json_response(StatusCode::OK, &file),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Patient not found", None),
        Err(e) => registry_unavailable(&e),
    }
}

/// DELETE /api/patients/{id}/file/
pub async fn handle_delete_patient(
    req: Request<Incoming>,
    state: Arc<AppState>,
    patient_id: i64,
) -> Response<BoxBody> {
    let claims = match authorize(&req, &state, Operation::DeletePatient) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match state.registry.delete_patient(patient_id).await {
        Ok(true) => {
            info!(patient_id, username = %claims.username, "Patient deleted");
            empty_response(StatusCode::NO_CONTENT)
        }
        Ok(false) => error_response(StatusCode::BAD_REQUEST, "Failed to delete patient", None),
        Err(e) => registry_unavailable(&e),
    }
}
