//! Patient enrollment from a free-text prompt
//!
//! The registry's AI endpoint is tried first. When it rejects the prompt a
//! walk-in placeholder patient is created instead so the front desk is never
//! blocked; clinicians correct the demographics afterwards.

use rand::Rng;
use serde_json::Value;
use tracing::{info, warn};

use crate::registry::{NewPatient, RegistryClient, RegistryError, RegistryReply};

/// Result of an enrollment attempt
#[derive(Debug, Clone)]
pub enum EnrollmentOutcome {
    Enrolled {
        /// Registry id of the new patient, when it reported one
        id: Option<Value>,
        /// True when the walk-in placeholder was used
        fallback: bool,
    },
    /// Both the AI and the fallback create were rejected
    Rejected { body: Value },
}

fn enrolled(reply: &RegistryReply, fallback: bool) -> EnrollmentOutcome {
    EnrollmentOutcome::Enrolled {
        id: reply.body.get("id").cloned(),
        fallback,
    }
}

/// Enroll a patient described by `prompt`
pub async fn enroll_patient(
    registry: &RegistryClient,
    prompt: &str,
) -> Result<EnrollmentOutcome, RegistryError> {
    let reply = registry.create_patient_ai(prompt).await?;
    if reply.accepted {
        info!("Patient enrolled by registry AI");
        return Ok(enrolled(&reply, false));
    }

    warn!(status = reply.status, "AI enrollment rejected, creating walk-in placeholder");

    let n = rand::thread_rng().gen_range(1000..=9999);
    let fallback = registry.create_patient(&NewPatient::walk_in(n)).await?;
    if fallback.accepted {
        info!(placeholder = n, "Walk-in placeholder patient created");
        Ok(enrolled(&fallback, true))
    } else {
        warn!(status = fallback.status, body = %fallback.body, "Walk-in placeholder rejected");
        Ok(EnrollmentOutcome::Rejected {
            body: fallback.body,
        })
    }
}
