//! Staff user document schema
//!
//! Stores hospital staff credentials and their role.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::StaffRole;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for staff users
pub const STAFF_USER_COLLECTION: &str = "staff_users";

/// Staff user document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StaffUserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Login name
    pub username: String,

    /// Argon2 password hash
    pub password_hash: String,

    #[serde(default)]
    pub role: StaffRole,

    /// Whether the account may log in
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl StaffUserDoc {
    /// Create a new staff user document
    pub fn new(username: String, password_hash: String, role: StaffRole) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            username,
            password_hash,
            role,
            is_active: true,
        }
    }

    /// Stable user id used as the JWT subject
    pub fn user_id(&self) -> String {
        self._id
            .map(|id| id.to_hex())
            .unwrap_or_else(|| self.username.clone())
    }
}

impl IntoIndexes for StaffUserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "username": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("username_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for StaffUserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_to_doctor() {
        let doc: StaffUserDoc = bson::from_document(doc! {
            "username": "house",
            "password_hash": "$argon2id$...",
        })
        .unwrap();
        assert_eq!(doc.role, StaffRole::Doctor);
        assert!(doc.is_active);
    }

    #[test]
    fn test_user_id_prefers_object_id() {
        let mut doc = StaffUserDoc::new("cuddy".into(), "h".into(), StaffRole::Admin);
        assert_eq!(doc.user_id(), "cuddy");

        let id = ObjectId::new();
        doc._id = Some(id);
        assert_eq!(doc.user_id(), id.to_hex());
    }
}
