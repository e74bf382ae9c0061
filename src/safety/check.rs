//! Post-encounter safety check
//!
//! Waits for the registry's asynchronous interaction analysis to settle,
//! fetches the encounter, filters noise and classifies what remains. A
//! registry failure is returned as an error: "could not verify" is never
//! reported as LOW.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::SafetyConfig;
use crate::registry::{InteractionRecord, RegistryError, RegistryGateway};
use crate::safety::classifier::{classify, RiskLevel};
use crate::safety::filter::filter_interactions;

/// Outcome of one safety check, serialized as `{risk, alerts}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyVerdict {
    pub risk: RiskLevel,
    /// Real findings only, in registry order
    pub alerts: Vec<InteractionRecord>,
    #[serde(skip_serializing)]
    pub encounter_id: String,
}

impl SafetyVerdict {
    /// Derive a verdict from an encounter's raw interaction list
    pub fn from_raw(encounter_id: impl Into<String>, raw: &[InteractionRecord]) -> Self {
        let alerts = filter_interactions(raw);
        let risk = classify(&alerts);
        Self {
            risk,
            alerts,
            encounter_id: encounter_id.into(),
        }
    }

    pub fn is_high(&self) -> bool {
        self.risk == RiskLevel::High
    }
}

/// Runs safety checks against the registry
#[derive(Clone)]
pub struct SafetyCheck {
    gateway: Arc<dyn RegistryGateway>,
    settle_delay: Duration,
}

impl SafetyCheck {
    pub fn new(gateway: Arc<dyn RegistryGateway>, config: SafetyConfig) -> Self {
        Self {
            gateway,
            settle_delay: config.settle_delay,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Check one freshly created encounter.
    ///
    /// The settling delay is an async sleep, so concurrent checks and other
    /// requests keep running while this one waits. Nothing is cached: each
    /// call re-reads the registry.
    pub async fn run(&self, encounter_id: &str) -> Result<SafetyVerdict, RegistryError> {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let payload = match self.gateway.fetch_encounter(encounter_id).await {
            Ok(p) => p,
            Err(e) => {
                warn!(encounter_id, error = %e, "Safety check could not reach registry");
                return Err(e);
            }
        };

        let verdict = SafetyVerdict::from_raw(encounter_id, &payload.drug_interactions);

        info!(
            encounter_id,
            risk = %verdict.risk,
            raw = payload.drug_interactions.len(),
            alerts = verdict.alerts.len(),
            "Safety check complete"
        );

        Ok(verdict)
    }
}
