//! HTTP Route for the safety audit trail
//!
//! - GET /api/safety/incidents[?patient_id=N] - Incidents, newest first
//!
//! Read-only. Incidents are never updated or deleted over HTTP.

use hyper::{body::Incoming, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::auth::Operation;
use crate::routes::common::{authorize, error_response, json_response, BoxBody};
use crate::safety::SafetyIncident;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IncidentQuery {
    pub patient_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct IncidentListResponse {
    pub incidents: Vec<SafetyIncident>,
    pub count: usize,
}

pub fn parse_incident_query(query: Option<&str>) -> Result<IncidentQuery, serde_urlencoded::de::Error> {
    serde_urlencoded::from_str(query.unwrap_or(""))
}

/// GET /api/safety/incidents
pub async fn handle_list_incidents(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    if let Err(resp) = authorize(&req, &state, Operation::ViewIncidents) {
        return resp;
    }

    let query = match parse_incident_query(req.uri().query()) {
        Ok(q) => q,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid query: {}", e), None)
        }
    };

    match state.safety.recorder().store().list(query.patient_id).await {
        Ok(incidents) => {
            let count = incidents.len();
            json_response(StatusCode::OK, &IncidentListResponse { incidents, count })
        }
        Err(e) => {
            error!(error = %e, "Failed to read safety incidents");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), Some("AUDIT_READ_FAILED"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_incident_query() {
        assert_eq!(parse_incident_query(None).unwrap().patient_id, None);
        assert_eq!(parse_incident_query(Some("patient_id=42")).unwrap().patient_id, Some(42));
        assert_eq!(
            parse_incident_query(Some("patient_id=42&other=x")).unwrap().patient_id,
            Some(42)
        );
        assert!(parse_incident_query(Some("patient_id=abc")).is_err());
    }
}
