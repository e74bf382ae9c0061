//! Clinical registry access
//!
//! The registry is the source of truth for patients, encounters and the
//! drug-interaction analysis attached to each encounter.

pub mod client;
pub mod types;

pub use client::{PatientRecordKind, RegistryClient, RegistryError, RegistryGateway};
pub use types::{
    id_to_string, EncounterPayload, InteractionRecord, ListEnvelope, NewPatient, RegistryReply,
};
