//! Safety check and audit against a mocked clinical registry

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pharmagate::config::{RegistryConfig, SafetyConfig};
use pharmagate::registry::{RegistryClient, RegistryError};
use pharmagate::safety::{
    AuditRecorder, DoctorRef, InMemoryIncidentStore, IncidentStore, RiskLevel, SafetyCheck,
};
use pharmagate::services::{EncounterCreated, SafetyPipeline, SafetyStatus};

fn registry(server: &MockServer, timeout: Duration) -> Arc<RegistryClient> {
    Arc::new(
        RegistryClient::new(&RegistryConfig {
            base_url: server.uri(),
            api_key: "test-key".into(),
            timeout,
        })
        .unwrap(),
    )
}

fn no_settle() -> SafetyConfig {
    SafetyConfig {
        settle_delay: Duration::ZERO,
    }
}

async fn mount_encounter(server: &MockServer, id: &str, interactions: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/encounters/{}", id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": id, "drug_interactions": interactions })),
        )
        .mount(server)
        .await;
}

fn pipeline(server: &MockServer, store: Arc<InMemoryIncidentStore>) -> SafetyPipeline {
    let check = SafetyCheck::new(registry(server, Duration::from_secs(5)), no_settle());
    SafetyPipeline::new(check, AuditRecorder::new(store))
}

fn created(encounter_id: &str) -> EncounterCreated {
    EncounterCreated {
        encounter_id: encounter_id.into(),
        patient_registry_id: 12,
        doctor: DoctorRef {
            user_id: "u-1".into(),
            username: "house".into(),
        },
    }
}

#[tokio::test]
async fn noise_only_encounter_is_low_and_not_audited() {
    let server = MockServer::start().await;
    mount_encounter(
        &server,
        "1",
        json!([{"reason": "No documented interaction between these drugs", "severity": "None"}]),
    )
    .await;
    let store = Arc::new(InMemoryIncidentStore::new());

    let report = pipeline(&server, store.clone())
        .on_encounter_created(&created("1"))
        .await
        .unwrap();

    let verdict = report.verdict.unwrap();
    assert_eq!(report.status, SafetyStatus::Checked);
    assert_eq!(verdict.risk, RiskLevel::Low);
    assert!(verdict.alerts.is_empty());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn major_interaction_is_high_and_audited_once() {
    let server = MockServer::start().await;
    let interactions = json!([{"reason": "Increases bleeding risk", "severity": "Major"}]);
    mount_encounter(&server, "2", interactions.clone()).await;
    let store = Arc::new(InMemoryIncidentStore::new());

    let report = pipeline(&server, store.clone())
        .on_encounter_created(&created("2"))
        .await
        .unwrap();

    assert_eq!(report.verdict.as_ref().unwrap().risk, RiskLevel::High);
    let incidents = store.list(None).await.unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].encounter_id, "2");
    assert_eq!(incidents[0].patient_registry_id, 12);
    assert_eq!(serde_json::to_value(&incidents[0].interaction_payload).unwrap(), interactions);
    assert_eq!(report.incident.unwrap().id, incidents[0].id);
}

#[tokio::test]
async fn minor_interaction_is_low() {
    let server = MockServer::start().await;
    mount_encounter(&server, "3", json!([{"reason": "Mild nausea reported", "severity": "Minor"}])).await;
    let store = Arc::new(InMemoryIncidentStore::new());

    let report = pipeline(&server, store.clone())
        .on_encounter_created(&created("3"))
        .await
        .unwrap();

    let verdict = report.verdict.unwrap();
    assert_eq!(verdict.risk, RiskLevel::Low);
    assert_eq!(verdict.alerts.len(), 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn registry_timeout_is_unknown_and_not_audited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/encounters/4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"drug_interactions": [{"reason": "x", "severity": "Major"}]}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let gateway = registry(&server, Duration::from_millis(100));
    let check = SafetyCheck::new(gateway, no_settle());
    assert!(matches!(check.run("4").await, Err(RegistryError::Timeout)));

    let store = Arc::new(InMemoryIncidentStore::new());
    let pipeline = SafetyPipeline::new(check, AuditRecorder::new(store.clone()));
    let report = pipeline.on_encounter_created(&created("4")).await.unwrap();

    assert_eq!(report.status, SafetyStatus::Unknown);
    assert!(report.verdict.is_none());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn mixed_interactions_keep_only_real_alerts() {
    let server = MockServer::start().await;
    mount_encounter(
        &server,
        "5",
        json!([
            {"reason": "No interaction found", "severity": "Unknown"},
            {"reason": "QT prolongation", "severity": "HIGH"},
            {"reason": "Mild drowsiness", "severity": "minor"}
        ]),
    )
    .await;
    let store = Arc::new(InMemoryIncidentStore::new());

    let report = pipeline(&server, store.clone())
        .on_encounter_created(&created("5"))
        .await
        .unwrap();

    let verdict = report.verdict.unwrap();
    assert_eq!(verdict.risk, RiskLevel::High);
    let reasons: Vec<_> = verdict.alerts.iter().map(|a| a.reason().to_string()).collect();
    assert_eq!(reasons, vec!["QT prolongation", "Mild drowsiness"]);
    assert_eq!(store.list(None).await.unwrap()[0].interaction_payload, verdict.alerts);
}

#[tokio::test]
async fn every_check_queries_the_registry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/encounters/6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"drug_interactions": []})))
        .expect(2)
        .mount(&server)
        .await;

    let check = SafetyCheck::new(registry(&server, Duration::from_secs(5)), no_settle());
    assert_eq!(check.run("6").await.unwrap().risk, RiskLevel::Low);
    assert_eq!(check.run("6").await.unwrap().risk, RiskLevel::Low);
}
