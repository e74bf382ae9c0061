//! HTTP client for the clinical registry
//!
//! Every call returns `Result<_, RegistryError>`: a transport failure, a
//! timeout or an unexpected status is never turned into an empty result.
//! Only an unparseable success body is recovered locally (as `{}`), because
//! the registry occasionally answers with an empty body.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::registry::types::{EncounterPayload, ListEnvelope, NewPatient, RegistryReply};

/// Registry call failures
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry client misconfigured: {0}")]
    Config(String),

    #[error("registry request timed out")]
    Timeout,

    #[error("registry unreachable: {0}")]
    Transport(String),

    #[error("registry returned status {status}")]
    Status { status: u16, body: String },

    #[error("unusable registry id '{0}'")]
    InvalidId(String),
}

impl RegistryError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RegistryError::Timeout
        } else {
            RegistryError::Transport(err.to_string())
        }
    }
}

/// Check that a registry-supplied id is a single path segment
fn checked_path_segment(id: &str) -> Result<&str, RegistryError> {
    let usable = !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '?', '#', '%']);
    if usable {
        Ok(id)
    } else {
        Err(RegistryError::InvalidId(id.to_string()))
    }
}

/// The slice of the registry the safety check depends on
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    /// Fetch an encounter with its interaction analysis
    async fn fetch_encounter(&self, encounter_id: &str) -> Result<EncounterPayload, RegistryError>;
}

/// Per-patient record lists exposed by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientRecordKind {
    Encounters,
    Medications,
    Tests,
}

impl PatientRecordKind {
    fn path_segment(&self) -> &'static str {
        match self {
            PatientRecordKind::Encounters => "encounters",
            PatientRecordKind::Medications => "medications",
            PatientRecordKind::Tests => "tests",
        }
    }
}

/// reqwest-backed registry client
#[derive(Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    /// Build a client from injected configuration
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&format!("Token {}", config.api_key))
            .map_err(|e| RegistryError::Config(format!("invalid API key header: {}", e)))?;
        headers.insert(AUTHORIZATION, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RegistryError::Config(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout.as_millis() as u64,
            "Registry client created"
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RegistryError> {
        request.send().await.map_err(RegistryError::from_reqwest)
    }

    /// Read a JSON body; an unparseable body is logged and read as `{}`
    async fn json_body(response: Response) -> Result<Value, RegistryError> {
        let bytes = response.bytes().await.map_err(RegistryError::from_reqwest)?;
        if bytes.is_empty() {
            return Ok(json!({}));
        }
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Registry sent a non-JSON body ({} bytes): {}", bytes.len(), e);
                Ok(json!({}))
            }
        }
    }

    async fn status_error(response: Response) -> RegistryError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status, "Registry rejected request");
        RegistryError::Status { status, body }
    }

    async fn get_json(&self, path: &str) -> Result<Value, RegistryError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        if response.status() != StatusCode::OK {
            return Err(Self::status_error(response).await);
        }
        Self::json_body(response).await
    }

    async fn get_list(&self, path: &str) -> Result<Vec<Value>, RegistryError> {
        let body = self.get_json(path).await?;
        let envelope: ListEnvelope = serde_json::from_value(body).unwrap_or_else(|e| {
            warn!(path, "Registry list envelope malformed: {}", e);
            ListEnvelope::default()
        });
        Ok(envelope.results)
    }

    /// POST a JSON body; 200/201 is accepted, any other status is a rejection
    async fn post_json(&self, path: &str, body: &Value) -> Result<RegistryReply, RegistryError> {
        let response = self.send(self.http.post(self.url(path)).json(body)).await?;
        let status = response.status();
        let accepted = status == StatusCode::OK || status == StatusCode::CREATED;
        let body = Self::json_body(response).await?;
        Ok(RegistryReply {
            accepted,
            status: status.as_u16(),
            body,
        })
    }

    /// `GET /patients`
    pub async fn list_patients(&self) -> Result<Vec<Value>, RegistryError> {
        self.get_list("/patients").await
    }

    /// `GET /patients/{id}`; `Ok(None)` when the registry reports 404
    pub async fn get_patient(&self, patient_id: i64) -> Result<Option<Value>, RegistryError> {
        match self.get_json(&format!("/patients/{}", patient_id)).await {
            Ok(profile) => Ok(Some(profile)),
            Err(RegistryError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `GET /patients/{id}/{encounters|medications|tests}`
    pub async fn list_patient_records(
        &self,
        patient_id: i64,
        kind: PatientRecordKind,
    ) -> Result<Vec<Value>, RegistryError> {
        self.get_list(&format!("/patients/{}/{}", patient_id, kind.path_segment()))
            .await
    }

    /// `DELETE /patients/{id}`; true only when the registry answers 204
    pub async fn delete_patient(&self, patient_id: i64) -> Result<bool, RegistryError> {
        let response = self
            .send(self.http.delete(self.url(&format!("/patients/{}", patient_id))))
            .await?;
        let deleted = response.status() == StatusCode::NO_CONTENT;
        if !deleted {
            warn!(patient_id, status = response.status().as_u16(), "Registry refused patient delete");
        }
        Ok(deleted)
    }

    /// `POST /ai/patient` - free-text enrollment
    pub async fn create_patient_ai(&self, prompt: &str) -> Result<RegistryReply, RegistryError> {
        debug!("Registering patient from prompt");
        self.post_json("/ai/patient", &json!({ "prompt": prompt })).await
    }

    /// `POST /patients/create` - structured enrollment
    pub async fn create_patient(&self, patient: &NewPatient) -> Result<RegistryReply, RegistryError> {
        let body = serde_json::to_value(patient)
            .map_err(|e| RegistryError::Config(format!("unserializable patient: {}", e)))?;
        self.post_json("/patients/create", &body).await
    }

    /// `POST /ai/emr` - AI-assisted clinical note for a patient
    pub async fn create_emr_ai(
        &self,
        patient_id: i64,
        prompt: &str,
    ) -> Result<RegistryReply, RegistryError> {
        self.post_json("/ai/emr", &json!({ "patient": patient_id, "prompt": prompt }))
            .await
    }
}

#[async_trait]
impl RegistryGateway for RegistryClient {
    async fn fetch_encounter(&self, encounter_id: &str) -> Result<EncounterPayload, RegistryError> {
        let segment = checked_path_segment(encounter_id)?;
        let body = self.get_json(&format!("/encounters/{}", segment)).await?;
        Ok(EncounterPayload::from_body(encounter_id, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> RegistryClient {
        RegistryClient::new(&RegistryConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            timeout,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_encounter_extracts_interactions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/encounters/42"))
            .and(header("Authorization", "Token test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42,
                "drug_interactions": [
                    {"reason": "Increases bleeding risk", "severity": "Major"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let payload = client.fetch_encounter("42").await.unwrap();

        assert_eq!(payload.encounter_id, "42");
        assert_eq!(payload.drug_interactions.len(), 1);
        assert_eq!(payload.drug_interactions[0].severity(), "Major");
    }

    #[test]
    fn test_checked_path_segment() {
        assert_eq!(checked_path_segment("42").unwrap(), "42");
        assert_eq!(checked_path_segment("enc-7f3a").unwrap(), "enc-7f3a");
        for bad in ["", ".", "..", "../patients/5", "5?x=1", "5#frag", "a\\b", "%2e%2e"] {
            assert!(matches!(checked_path_segment(bad), Err(RegistryError::InvalidId(_))), "{bad}");
        }
    }

    #[tokio::test]
    async fn test_fetch_encounter_rejects_traversal_id_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .fetch_encounter("../patients/5")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidId(id) if id == "../patients/5"));
    }

    #[tokio::test]
    async fn test_fetch_encounter_missing_field_is_empty_not_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/encounters/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
            .mount(&server)
            .await;

        let payload = client_for(&server, Duration::from_secs(5))
            .fetch_encounter("5")
            .await
            .unwrap();
        assert!(payload.drug_interactions.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_encounter_non_json_body_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/encounters/6"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let payload = client_for(&server, Duration::from_secs(5))
            .fetch_encounter("6")
            .await
            .unwrap();
        assert!(payload.drug_interactions.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_encounter_error_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/encounters/9"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .fetch_encounter("9")
            .await
            .unwrap_err();
        match err {
            RegistryError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_encounter_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/encounters/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"drug_interactions": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_millis(50))
            .fetch_encounter("1")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Timeout));
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_transport_error() {
        let client = RegistryClient::new(&RegistryConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: "k".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let err = client.fetch_encounter("1").await.unwrap_err();
        assert!(matches!(err, RegistryError::Transport(_) | RegistryError::Timeout));
    }

    #[tokio::test]
    async fn test_get_patient_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients/77"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        assert!(client.get_patient(77).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_patient_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients/3/medications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"name": "warfarin"}, {"name": "aspirin"}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let meds = client
            .list_patient_records(3, PatientRecordKind::Medications)
            .await
            .unwrap();
        assert_eq!(meds.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_patient_requires_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/patients/3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/patients/4"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        assert!(client.delete_patient(3).await.unwrap());
        assert!(!client.delete_patient(4).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_emr_ai_forwards_rejection_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ai/emr"))
            .and(body_json(json!({"patient": 8, "prompt": "start warfarin"})))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "unknown patient"})))
            .mount(&server)
            .await;

        let reply = client_for(&server, Duration::from_secs(5))
            .create_emr_ai(8, "start warfarin")
            .await
            .unwrap();
        assert!(!reply.accepted);
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["detail"], "unknown patient");
    }
}
