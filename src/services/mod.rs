//! Services layer for pharmagate
//!
//! Business logic between the HTTP routes and the registry / safety pipeline.
//!
//! ## Services
//!
//! - **Intent**: decides whether an AI prompt enrolls a patient or is a clinical note
//! - **ClinicalNote**: safety check and audit for encounters created by a note
//! - **Enrollment**: AI patient enrollment with walk-in fallback
//! - **PatientFile**: profile + timeline + medications + tests aggregation

pub mod clinical_note;
pub mod enrollment;
pub mod intent;
pub mod patient_file;

pub use clinical_note::{
    created_resource, CreatedResource, EncounterCreated, SafetyPipeline, SafetyReport,
    SafetyStatus, UnauditedVerdict, ENCOUNTER_RESOURCE,
};
pub use enrollment::{enroll_patient, EnrollmentOutcome};
pub use intent::{route_intent, ActionIntent, ENROLLMENT_KEYWORDS};
pub use patient_file::{fetch_patient_file, PatientFile};
