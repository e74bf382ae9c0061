//! Safety incident document schema
//!
//! One document per high-risk safety verdict. Documents are inserted once and
//! never updated; the unique index on `encounter_id` rejects a second incident
//! for the same encounter.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::registry::InteractionRecord;

/// Collection name for safety incidents
pub const SAFETY_INCIDENT_COLLECTION: &str = "safety_incidents";

/// Safety incident stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SafetyIncidentDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Staff user id of the clinician who wrote the note
    pub doctor_id: String,

    pub doctor_username: String,

    /// Patient id in the clinical registry (not a local reference)
    pub patient_registry_id: i64,

    /// Encounter whose interaction analysis raised the incident
    pub encounter_id: String,

    /// Alerts exactly as reported by the registry
    pub interaction_payload: Vec<InteractionRecord>,
}

impl IntoIndexes for SafetyIncidentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "encounter_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("encounter_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "patient_registry_id": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("patient_created_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for SafetyIncidentDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trips_through_bson() {
        let doc = SafetyIncidentDoc {
            doctor_id: "u1".into(),
            doctor_username: "house".into(),
            patient_registry_id: 12,
            encounter_id: "99".into(),
            interaction_payload: vec![InteractionRecord::new("Increases bleeding risk", "Major")],
            ..Default::default()
        };

        let stored = bson::to_document(&doc).unwrap();
        let back: SafetyIncidentDoc = bson::from_document(stored).unwrap();
        assert_eq!(back.interaction_payload, doc.interaction_payload);
        assert_eq!(back.patient_registry_id, 12);
    }
}
