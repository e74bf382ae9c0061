//! Database schemas for pharmagate
//!
//! Defines MongoDB document structures for staff users and safety incidents.

mod metadata;
mod safety_incident;
mod user;

pub use metadata::Metadata;
pub use safety_incident::{SafetyIncidentDoc, SAFETY_INCIDENT_COLLECTION};
pub use user::{StaffUserDoc, STAFF_USER_COLLECTION};
