//! Safety handling for newly created encounters
//!
//! When an AI clinical note creates an Encounter, the encounter is checked
//! for drug interactions and a HIGH verdict is audited. The outcome tells the
//! caller whether safety was verified, could not be verified, or did not
//! apply, so "unknown" is never shown as "safe".

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::registry::id_to_string;
use crate::safety::{AuditError, AuditRecorder, DoctorRef, SafetyCheck, SafetyIncident, SafetyVerdict};

/// Registry resource kind that triggers a safety check
pub const ENCOUNTER_RESOURCE: &str = "Encounter";

/// An encounter was just created for a patient by a doctor
#[derive(Debug, Clone)]
pub struct EncounterCreated {
    pub encounter_id: String,
    pub patient_registry_id: i64,
    pub doctor: DoctorRef,
}

/// Safety state reported alongside a clinical note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyStatus {
    /// A verdict was derived from the registry
    Checked,
    /// The registry could not be queried; safety is unknown
    Unknown,
    /// The note did not create an encounter
    NotApplicable,
}

/// Outcome of the post-encounter safety handling
#[derive(Debug, Clone)]
pub struct SafetyReport {
    pub status: SafetyStatus,
    pub verdict: Option<SafetyVerdict>,
    pub incident: Option<SafetyIncident>,
}

impl SafetyReport {
    pub fn not_applicable() -> Self {
        Self {
            status: SafetyStatus::NotApplicable,
            verdict: None,
            incident: None,
        }
    }

    /// Safety could not be verified; never read as safe
    pub fn unknown() -> Self {
        Self {
            status: SafetyStatus::Unknown,
            verdict: None,
            incident: None,
        }
    }
}

/// A HIGH verdict whose incident could not be written
#[derive(Debug, Error)]
#[error("HIGH risk verdict for encounter {} was not audited: {source}", .verdict.encounter_id)]
pub struct UnauditedVerdict {
    pub verdict: SafetyVerdict,
    #[source]
    pub source: AuditError,
}

/// What a clinical-note reply says was created
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedResource {
    /// An Encounter with a usable id
    Encounter(String),
    /// An Encounter exists but its id is missing or unusable
    EncounterWithoutId,
    /// Anything other than an Encounter
    Other,
}

/// Classify a registry reply to `POST /ai/emr`
pub fn created_resource(reply: &Value) -> CreatedResource {
    if reply.get("resource").and_then(Value::as_str) != Some(ENCOUNTER_RESOURCE) {
        return CreatedResource::Other;
    }
    match reply.get("id").and_then(id_to_string) {
        Some(id) => CreatedResource::Encounter(id),
        None => CreatedResource::EncounterWithoutId,
    }
}

/// Safety check followed by audit, for one encounter
#[derive(Clone)]
pub struct SafetyPipeline {
    check: SafetyCheck,
    recorder: AuditRecorder,
}

impl SafetyPipeline {
    pub fn new(check: SafetyCheck, recorder: AuditRecorder) -> Self {
        Self { check, recorder }
    }

    pub fn check(&self) -> &SafetyCheck {
        &self.check
    }

    pub fn recorder(&self) -> &AuditRecorder {
        &self.recorder
    }

    /// Check the encounter and audit a HIGH verdict.
    ///
    /// A registry failure yields `SafetyStatus::Unknown` with no verdict and
    /// no incident. An audit failure is an error that still carries the
    /// verdict so the clinician can be shown the alerts.
    pub async fn on_encounter_created(
        &self,
        event: &EncounterCreated,
    ) -> Result<SafetyReport, UnauditedVerdict> {
        let verdict = match self.check.run(&event.encounter_id).await {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    encounter_id = %event.encounter_id,
                    patient_registry_id = event.patient_registry_id,
                    error = %e,
                    "Safety status unknown for new encounter"
                );
                return Ok(SafetyReport::unknown());
            }
        };

        match self
            .recorder
            .record_if_high_risk(&event.doctor, event.patient_registry_id, &verdict)
            .await
        {
            Ok(incident) => Ok(SafetyReport {
                status: SafetyStatus::Checked,
                verdict: Some(verdict),
                incident,
            }),
            Err(source) => Err(UnauditedVerdict { verdict, source }),
        }
    }
}
