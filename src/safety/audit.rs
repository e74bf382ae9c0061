//! Compliance audit trail for high-risk safety verdicts
//!
//! A HIGH verdict produces exactly one `SafetyIncident`. Stores only append
//! and read; there is no update or delete path. A failed write is returned to
//! the caller: an unaudited high-risk verdict is itself a compliance problem.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::registry::InteractionRecord;
use crate::safety::check::SafetyVerdict;

/// Audit trail failures
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("safety incident for encounter {0} already recorded")]
    Duplicate(String),

    #[error("audit write failed: {0}")]
    Write(String),

    #[error("audit read failed: {0}")]
    Read(String),
}

/// Clinician who initiated the clinical note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRef {
    pub user_id: String,
    pub username: String,
}

/// Incident to be appended
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub doctor: DoctorRef,
    pub patient_registry_id: i64,
    pub encounter_id: String,
    pub interaction_payload: Vec<InteractionRecord>,
}

/// Persisted audit record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyIncident {
    pub id: String,
    pub doctor: DoctorRef,
    pub patient_registry_id: i64,
    pub encounter_id: String,
    pub interaction_payload: Vec<InteractionRecord>,
    pub created_at: DateTime<Utc>,
}

/// Append-only incident storage
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Persist one incident atomically, assigning its id and timestamp
    async fn append(&self, incident: NewIncident) -> Result<SafetyIncident, AuditError>;

    /// Incidents newest first, optionally for one patient
    async fn list(&self, patient_registry_id: Option<i64>) -> Result<Vec<SafetyIncident>, AuditError>;

    /// Short backend name for health output
    fn backend(&self) -> &'static str;
}

/// Writes incidents for high-risk verdicts
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn IncidentStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn IncidentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn IncidentStore> {
        &self.store
    }

    /// Record an incident when `verdict` is HIGH; LOW verdicts are a no-op.
    pub async fn record_if_high_risk(
        &self,
        doctor: &DoctorRef,
        patient_registry_id: i64,
        verdict: &SafetyVerdict,
    ) -> Result<Option<SafetyIncident>, AuditError> {
        if !verdict.is_high() {
            return Ok(None);
        }

        let incident = NewIncident {
            doctor: doctor.clone(),
            patient_registry_id,
            encounter_id: verdict.encounter_id.clone(),
            interaction_payload: verdict.alerts.clone(),
        };

        match self.store.append(incident).await {
            Ok(stored) => {
                info!(
                    incident_id = %stored.id,
                    encounter_id = %stored.encounter_id,
                    patient_registry_id,
                    doctor = %doctor.username,
                    alerts = stored.interaction_payload.len(),
                    "Safety incident recorded"
                );
                Ok(Some(stored))
            }
            Err(e) => {
                error!(
                    encounter_id = %verdict.encounter_id,
                    patient_registry_id,
                    doctor = %doctor.username,
                    error = %e,
                    "HIGH risk verdict could not be audited"
                );
                Err(e)
            }
        }
    }
}

/// In-process incident store for dev mode and tests
#[derive(Default)]
pub struct InMemoryIncidentStore {
    incidents: RwLock<Vec<SafetyIncident>>,
}

impl InMemoryIncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.incidents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.incidents.read().await.is_empty()
    }
}

#[async_trait]
impl IncidentStore for InMemoryIncidentStore {
    async fn append(&self, incident: NewIncident) -> Result<SafetyIncident, AuditError> {
        let mut incidents = self.incidents.write().await;

        if incidents.iter().any(|i| i.encounter_id == incident.encounter_id) {
            return Err(AuditError::Duplicate(incident.encounter_id));
        }

        let stored = SafetyIncident {
            id: uuid::Uuid::new_v4().to_string(),
            doctor: incident.doctor,
            patient_registry_id: incident.patient_registry_id,
            encounter_id: incident.encounter_id,
            interaction_payload: incident.interaction_payload,
            created_at: Utc::now(),
        };
        incidents.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, patient_registry_id: Option<i64>) -> Result<Vec<SafetyIncident>, AuditError> {
        let incidents = self.incidents.read().await;
        Ok(incidents
            .iter()
            .rev()
            .filter(|i| patient_registry_id.map_or(true, |p| i.patient_registry_id == p))
            .cloned()
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
