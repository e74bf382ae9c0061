//! Staff roles and route permissions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hospital staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum StaffRole {
    /// Writes clinical notes and manages patients
    #[default]
    Doctor,
    /// Reviews interaction incidents
    Pharmacist,
    /// Full access including the audit log
    Admin,
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffRole::Doctor => write!(f, "DOCTOR"),
            StaffRole::Pharmacist => write!(f, "PHARMACIST"),
            StaffRole::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "doctor" => Ok(StaffRole::Doctor),
            "pharmacist" => Ok(StaffRole::Pharmacist),
            "admin" => Ok(StaffRole::Admin),
            other => Err(format!("unknown staff role '{}'", other)),
        }
    }
}

/// Protected operations exposed over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListPatients,
    ViewPatientFile,
    DeletePatient,
    AiAction,
    ViewIncidents,
}

/// Check if a role may perform an operation
pub fn is_operation_allowed(operation: Operation, role: StaffRole) -> bool {
    match operation {
        Operation::ListPatients
        | Operation::ViewPatientFile
        | Operation::DeletePatient
        | Operation::AiAction => true,
        // Audit log is for compliance review
        Operation::ViewIncidents => matches!(role, StaffRole::Pharmacist | StaffRole::Admin),
    }
}
