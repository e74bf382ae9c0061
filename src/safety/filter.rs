//! Interaction noise filter

use crate::registry::InteractionRecord;
use crate::safety::vocabulary::is_noise_reason;

/// Drop records whose reason asserts "no interaction", keeping order.
pub fn filter_interactions(raw: &[InteractionRecord]) -> Vec<InteractionRecord> {
    raw.iter()
        .filter(|record| !is_noise_reason(record.reason()))
        .cloned()
        .collect()
}
