//! Risk classification for filtered interactions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::registry::InteractionRecord;
use crate::safety::vocabulary::is_high_severity;

/// Risk level of a safety verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Classify already-filtered alerts.
///
/// HIGH only when at least one alert carries an escalating severity. Real
/// alerts with benign or unknown severities stay LOW.
pub fn classify(alerts: &[InteractionRecord]) -> RiskLevel {
    if alerts.iter().any(|alert| is_high_severity(alert.severity())) {
        RiskLevel::High
    } else {
        RiskLevel::Low
    }
}
