//! Aggregated patient file
//!
//! Profile, encounter timeline, medications and tests from the registry in
//! one response. A failed sub-request fails the whole file rather than
//! returning a silently incomplete chart.

use serde::Serialize;
use serde_json::Value;

use crate::registry::{PatientRecordKind, RegistryClient, RegistryError};

#[derive(Debug, Clone, Serialize)]
pub struct PatientFile {
    pub profile: Value,
    /// Encounters, newest first
    pub timeline: Vec<Value>,
    pub medications: Vec<Value>,
    pub tests: Vec<Value>,
}

/// Fetch a patient's full file; `Ok(None)` when the patient does not exist
pub async fn fetch_patient_file(
    registry: &RegistryClient,
    patient_id: i64,
) -> Result<Option<PatientFile>, RegistryError> {
    let Some(profile) = registry.get_patient(patient_id).await? else {
        return Ok(None);
    };

    let (mut timeline, medications, tests) = tokio::try_join!(
        registry.list_patient_records(patient_id, PatientRecordKind::Encounters),
        registry.list_patient_records(patient_id, PatientRecordKind::Medications),
        registry.list_patient_records(patient_id, PatientRecordKind::Tests),
    )?;

    sort_newest_first(&mut timeline);

    Ok(Some(PatientFile {
        profile,
        timeline,
        medications,
        tests,
    }))
}

/// Sort by `created_at` descending; entries without one go last
fn sort_newest_first(entries: &mut [Value]) {
    entries.sort_by(|a, b| {
        let a = a.get("created_at").and_then(Value::as_str).unwrap_or("");
        let b = b.get("created_at").and_then(Value::as_str).unwrap_or("");
        b.cmp(a)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RegistryClient {
        RegistryClient::new(&RegistryConfig {
            base_url: server.uri(),
            api_key: "k".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    async fn mount_list(server: &MockServer, p: &str, status: u16, results: Value) {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "results": results })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_timeline_sorted_newest_first() {
        let mut entries = vec![
            json!({"id": 1, "created_at": "2024-01-02T10:00:00Z"}),
            json!({"id": 2}),
            json!({"id": 3, "created_at": "2024-03-01T08:00:00Z"}),
        ];
        sort_newest_first(&mut entries);
        let ids: Vec<_> = entries.iter().map(|e| e["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_full_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12, "first_name": "Ana"})))
            .mount(&server)
            .await;
        mount_list(
            &server,
            "/patients/12/encounters",
            200,
            json!([
                {"id": 1, "created_at": "2024-01-01T00:00:00Z"},
                {"id": 2, "created_at": "2024-06-01T00:00:00Z"}
            ]),
        )
        .await;
        mount_list(&server, "/patients/12/medications", 200, json!([{"name": "warfarin"}])).await;
        mount_list(&server, "/patients/12/tests", 200, json!([])).await;

        let file = fetch_patient_file(&client_for(&server), 12).await.unwrap().unwrap();
        assert_eq!(file.profile["first_name"], "Ana");
        assert_eq!(file.timeline[0]["id"], 2);
        assert_eq!(file.medications.len(), 1);
        assert!(file.tests.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_patient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(fetch_patient_file(&client_for(&server), 404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sub_request_failure_fails_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
            .mount(&server)
            .await;
        mount_list(&server, "/patients/5/encounters", 200, json!([])).await;
        mount_list(&server, "/patients/5/medications", 502, json!([])).await;
        mount_list(&server, "/patients/5/tests", 200, json!([])).await;

        let err = fetch_patient_file(&client_for(&server), 5).await.unwrap_err();
        assert!(matches!(err, RegistryError::Status { status: 502, .. }));
    }
}
