//! Routing of free-text AI prompts
//!
//! A prompt either enrolls a new patient or is a clinical note for an
//! existing one. The decision is a keyword heuristic.

/// Phrases that mark a prompt as a patient enrollment
pub const ENROLLMENT_KEYWORDS: &[&str] = &["new patient", "enroll", "register", "add patient"];

/// What an AI prompt asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionIntent {
    Enroll,
    ClinicalNote,
}

/// Classify a prompt (case-insensitive)
pub fn route_intent(prompt: &str) -> ActionIntent {
    let prompt = prompt.to_lowercase();
    if ENROLLMENT_KEYWORDS.iter().any(|k| prompt.contains(k)) {
        ActionIntent::Enroll
    } else {
        ActionIntent::ClinicalNote
    }
}
