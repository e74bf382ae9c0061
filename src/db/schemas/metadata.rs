//! Common metadata for all documents
//!
//! Tracks creation and update timestamps. Nothing in pharmagate deletes
//! documents, so there is no soft-delete marker.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Common metadata for all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Create new metadata with current timestamp
    pub fn new() -> Self {
        Self::at(DateTime::now())
    }

    /// Metadata created at a fixed instant
    pub fn at(created_at: DateTime) -> Self {
        Self {
            updated_at: Some(created_at),
            created_at: Some(created_at),
        }
    }
}
