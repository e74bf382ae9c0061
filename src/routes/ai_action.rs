//! HTTP Route for free-text AI actions
//!
//! - POST /api/ai/action - Enroll a patient or write a clinical note
//!
//! A clinical note that creates an Encounter is safety-checked before the
//! response is sent. The response always says whether safety was checked.

use hyper::{body::Incoming, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::Operation;
use crate::routes::common::{authorize, error_response, json_response, parse_json_body, BoxBody};
use crate::routes::patients::registry_unavailable;
use crate::safety::{DoctorRef, SafetyVerdict};
use crate::server::AppState;
use crate::services::{
    created_resource, enroll_patient, route_intent, ActionIntent, CreatedResource,
    EncounterCreated, EnrollmentOutcome, SafetyReport, SafetyStatus,
};

#[derive(Debug, Deserialize)]
pub struct AiActionRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub patient_id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmrResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: Value,
    pub safety: Option<SafetyVerdict>,
    pub safety_status: SafetyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl EmrResponse {
    fn new(data: Value, report: SafetyReport) -> Self {
        Self {
            kind: "emr",
            data,
            safety: report.verdict,
            safety_status: report.status,
            incident_id: report.incident.map(|i| i.id),
            error: None,
            code: None,
        }
    }
}

/// Patient id sent as a JSON number or a numeric string
fn patient_id_from(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// POST /api/ai/action
pub async fn handle_ai_action(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let claims = match authorize(&req, &state, Operation::AiAction) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: AiActionRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string(), None),
    };

    if body.prompt.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing required field: prompt", None);
    }

    match route_intent(&body.prompt) {
        ActionIntent::Enroll => enroll(&state, &body.prompt).await,
        ActionIntent::ClinicalNote => {
            let Some(patient_id) = patient_id_from(body.patient_id.as_ref()) else {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "Valid Patient ID required for clinical notes",
                    None,
                );
            };
            let doctor = DoctorRef {
                user_id: claims.sub,
                username: claims.username,
            };
            clinical_note(&state, patient_id, &body.prompt, doctor).await
        }
    }
}

async fn enroll(state: &AppState, prompt: &str) -> Response<BoxBody> {
    match enroll_patient(&state.registry, prompt).await {
        Ok(EnrollmentOutcome::Enrolled { id, fallback }) => {
            info!(fallback, "Enrollment complete");
            json_response(StatusCode::CREATED, &EnrollResponse { kind: "enroll", id })
        }
        Ok(EnrollmentOutcome::Rejected { body }) => json_response(StatusCode::BAD_REQUEST, &body),
        Err(e) => registry_unavailable(&e),
    }
}

async fn clinical_note(
    state: &AppState,
    patient_id: i64,
    prompt: &str,
    doctor: DoctorRef,
) -> Response<BoxBody> {
    let reply = match state.registry.create_emr_ai(patient_id, prompt).await {
        Ok(r) => r,
        Err(e) => return registry_unavailable(&e),
    };

    if !reply.accepted {
        warn!(patient_id, status = reply.status, "Clinical note rejected by registry");
        return json_response(
            StatusCode::BAD_REQUEST,
            &EmrResponse::new(reply.body, SafetyReport::not_applicable()),
        );
    }

    let encounter_id = match created_resource(&reply.body) {
        CreatedResource::Encounter(id) => id,
        CreatedResource::EncounterWithoutId => {
            warn!(patient_id, "Encounter created without a usable id, safety unknown");
            return json_response(
                StatusCode::OK,
                &EmrResponse::new(reply.body, SafetyReport::unknown()),
            );
        }
        CreatedResource::Other => {
            return json_response(
                StatusCode::OK,
                &EmrResponse::new(reply.body, SafetyReport::not_applicable()),
            );
        }
    };

    let event = EncounterCreated {
        encounter_id,
        patient_registry_id: patient_id,
        doctor,
    };

    match state.safety.on_encounter_created(&event).await {
        Ok(report) => json_response(StatusCode::OK, &EmrResponse::new(reply.body, report)),
        Err(unaudited) => {
            error!(error = %unaudited, "Returning unaudited HIGH risk verdict");
            let error = unaudited.to_string();
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &EmrResponse {
                    kind: "emr",
                    data: reply.body,
                    safety: Some(unaudited.verdict),
                    safety_status: SafetyStatus::Checked,
                    incident_id: None,
                    error: Some(error),
                    code: Some("AUDIT_WRITE_FAILED"),
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patient_id_from() {
        assert_eq!(patient_id_from(Some(&json!(12))), Some(12));
        assert_eq!(patient_id_from(Some(&json!("12"))), Some(12));
        assert_eq!(patient_id_from(Some(&json!(" 7 "))), Some(7));
        assert_eq!(patient_id_from(Some(&json!("twelve"))), None);
        assert_eq!(patient_id_from(Some(&json!(1.5))), None);
        assert_eq!(patient_id_from(Some(&json!(null))), None);
        assert_eq!(patient_id_from(None), None);
    }

    #[test]
    fn test_not_applicable_shape() {
        let resp = EmrResponse::new(json!({"resource": "Note"}), SafetyReport::not_applicable());
        let value = serde_json::to_value(resp).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "emr",
                "data": {"resource": "Note"},
                "safety": null,
                "safetyStatus": "NOT_APPLICABLE"
            })
        );
    }
}
