//! Wire types for the clinical registry
//!
//! The registry's payloads are loosely shaped, so these types read fields
//! leniently and keep the original JSON around instead of forcing a schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Field on an encounter that carries the interaction analysis
pub const DRUG_INTERACTIONS_FIELD: &str = "drug_interactions";

/// One reported interaction between two substances.
///
/// Holds the registry's JSON object verbatim so that audit records store
/// exactly what the registry reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionRecord {
    fields: Map<String, Value>,
}

impl InteractionRecord {
    /// Build a record from a reason and severity
    pub fn new(reason: impl Into<String>, severity: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("reason".into(), Value::String(reason.into()));
        fields.insert("severity".into(), Value::String(severity.into()));
        Self { fields }
    }

    /// Wrap a JSON value; only objects are interaction records
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Free-text explanation, empty when absent
    pub fn reason(&self) -> &str {
        self.text("reason")
    }

    /// Severity label as reported, empty when absent
    pub fn severity(&self) -> &str {
        self.text("severity")
    }

    /// The record as reported by the registry
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn text(&self, key: &str) -> &str {
        self.fields.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

impl From<Map<String, Value>> for InteractionRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// An encounter as returned by `GET /encounters/{id}`
#[derive(Debug, Clone)]
pub struct EncounterPayload {
    pub encounter_id: String,
    /// Raw interaction list, empty when the registry sent none
    pub drug_interactions: Vec<InteractionRecord>,
    pub body: Value,
}

impl EncounterPayload {
    /// Extract the interaction list from an encounter body.
    ///
    /// A missing or non-array field is an empty list, and non-object entries
    /// are skipped.
    pub fn from_body(encounter_id: impl Into<String>, body: Value) -> Self {
        let encounter_id = encounter_id.into();

        let drug_interactions = match body.get(DRUG_INTERACTIONS_FIELD) {
            Some(Value::Array(items)) => items
                .iter()
                .cloned()
                .filter_map(|item| {
                    let record = InteractionRecord::from_value(item);
                    if record.is_none() {
                        warn!(encounter_id = %encounter_id, "Skipping non-object interaction entry");
                    }
                    record
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                warn!(
                    encounter_id = %encounter_id,
                    kind = json_kind(other),
                    "Encounter drug_interactions is not an array, treating as empty"
                );
                Vec::new()
            }
        };

        Self {
            encounter_id,
            drug_interactions,
            body,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Registry list envelope (`{"results": [...]}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEnvelope {
    #[serde(default)]
    pub results: Vec<Value>,
}

/// Result of a registry write that may legitimately be rejected.
///
/// The registry answers rejected writes with a JSON body describing the
/// problem; callers forward it rather than treating it as a transport error.
#[derive(Debug, Clone)]
pub struct RegistryReply {
    pub accepted: bool,
    pub status: u16,
    pub body: Value,
}

/// Placeholder patient used when AI enrollment is rejected
#[derive(Debug, Clone, Serialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub age: String,
    pub address: String,
    pub email: String,
    pub allergies: Vec<String>,
}

impl NewPatient {
    /// Walk-in placeholder numbered `n`
    pub fn walk_in(n: u32) -> Self {
        Self {
            first_name: "New".to_string(),
            last_name: format!("Patient-{}", n),
            gender: "Male".to_string(),
            age: "30".to_string(),
            address: "Walk-in Backup Address".to_string(),
            email: format!("patient{}@hospital.com", n),
            allergies: Vec::new(),
        }
    }
}

/// Render a JSON id (number or string) for use in a URL path
pub fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
