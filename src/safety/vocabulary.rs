//! Severity and noise vocabulary used by the interaction filter and the risk
//! classifier. All entries are lower-case; callers lower-case the registry's
//! text before comparing.

/// Severity labels that escalate a verdict to HIGH
pub const HIGH_SEVERITY_LABELS: &[&str] = &["major", "high", "moderate", "critical"];

/// Phrases the registry uses to report the absence of an interaction
pub const NOISE_PHRASES: &[&str] = &["no documented", "no interaction"];

/// True when `severity` (any case) is an escalating label
pub fn is_high_severity(severity: &str) -> bool {
    let severity = severity.to_lowercase();
    HIGH_SEVERITY_LABELS.contains(&severity.as_str())
}

/// True when `reason` (any case) asserts there is no interaction
pub fn is_noise_reason(reason: &str) -> bool {
    let reason = reason.to_lowercase();
    NOISE_PHRASES.iter().any(|phrase| reason.contains(phrase))
}
