//! Drug-interaction safety pipeline
//!
//! Registry encounter → noise filter → risk classifier → verdict, and for HIGH
//! verdicts an append-only compliance incident.
//!
//! - **vocabulary**: escalating severities and "no interaction" phrases
//! - **filter** / **classifier**: pure functions over interaction records
//! - **check**: settling delay + registry fetch + classification
//! - **audit**: incident recorder and stores (MongoDB, in-memory)

pub mod audit;
pub mod check;
pub mod classifier;
pub mod filter;
pub mod mongo_store;
pub mod vocabulary;

pub use audit::{
    AuditError, AuditRecorder, DoctorRef, InMemoryIncidentStore, IncidentStore, NewIncident,
    SafetyIncident,
};
pub use check::{SafetyCheck, SafetyVerdict};
pub use classifier::{classify, RiskLevel};
pub use filter::filter_interactions;
pub use mongo_store::MongoIncidentStore;
pub use vocabulary::{HIGH_SEVERITY_LABELS, NOISE_PHRASES};
