//! MongoDB-backed incident store

use async_trait::async_trait;
use bson::doc;
use chrono::Utc;

use crate::db::schemas::{Metadata, SafetyIncidentDoc, SAFETY_INCIDENT_COLLECTION};
use crate::db::{is_duplicate_key, MongoClient, MongoCollection};
use crate::safety::audit::{AuditError, DoctorRef, IncidentStore, NewIncident, SafetyIncident};
use crate::types::GatewayError;

/// Incident store over the `safety_incidents` collection
pub struct MongoIncidentStore {
    collection: MongoCollection<SafetyIncidentDoc>,
}

impl MongoIncidentStore {
    /// Open the collection and ensure its indexes
    pub async fn open(mongo: &MongoClient) -> Result<Self, GatewayError> {
        let collection = mongo
            .collection::<SafetyIncidentDoc>(SAFETY_INCIDENT_COLLECTION)
            .await?;
        Ok(Self { collection })
    }
}

fn to_incident(doc: SafetyIncidentDoc) -> SafetyIncident {
    SafetyIncident {
        id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
        doctor: DoctorRef {
            user_id: doc.doctor_id,
            username: doc.doctor_username,
        },
        patient_registry_id: doc.patient_registry_id,
        encounter_id: doc.encounter_id,
        interaction_payload: doc.interaction_payload,
        created_at: doc
            .metadata
            .created_at
            .map(|t| t.to_chrono())
            .unwrap_or_default(),
    }
}

#[async_trait]
impl IncidentStore for MongoIncidentStore {
    async fn append(&self, incident: NewIncident) -> Result<SafetyIncident, AuditError> {
        // Stamp here so the returned record carries the stored timestamp
        let created_at = bson::DateTime::from_chrono(Utc::now());

        let mut doc = SafetyIncidentDoc {
            _id: None,
            metadata: Metadata::at(created_at),
            doctor_id: incident.doctor.user_id,
            doctor_username: incident.doctor.username,
            patient_registry_id: incident.patient_registry_id,
            encounter_id: incident.encounter_id,
            interaction_payload: incident.interaction_payload,
        };

        let id = self.collection.insert_one(doc.clone()).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AuditError::Duplicate(doc.encounter_id.clone())
            } else {
                AuditError::Write(e.to_string())
            }
        })?;

        doc._id = Some(id);
        Ok(to_incident(doc))
    }

    async fn list(&self, patient_registry_id: Option<i64>) -> Result<Vec<SafetyIncident>, AuditError> {
        let filter = match patient_registry_id {
            Some(patient) => doc! { "patient_registry_id": patient },
            None => doc! {},
        };

        let docs = self
            .collection
            .find_many(filter, Some(doc! { "metadata.created_at": -1 }))
            .await
            .map_err(|e| AuditError::Read(e.to_string()))?;

        Ok(docs.into_iter().map(to_incident).collect())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InteractionRecord;
    use bson::oid::ObjectId;

    #[test]
    fn test_doc_to_incident() {
        let id = ObjectId::new();
        let created_at = bson::DateTime::from_millis(1_700_000_000_000);
        let incident = to_incident(SafetyIncidentDoc {
            _id: Some(id),
            metadata: Metadata::at(created_at),
            doctor_id: "u-9".into(),
            doctor_username: "wilson".into(),
            patient_registry_id: 5,
            encounter_id: "e-5".into(),
            interaction_payload: vec![InteractionRecord::new("Bleeding", "Major")],
        });

        assert_eq!(incident.id, id.to_hex());
        assert_eq!(incident.doctor.username, "wilson");
        assert_eq!(incident.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(incident.interaction_payload.len(), 1);
    }
}
