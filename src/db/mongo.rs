//! MongoDB client and collection wrapper
//!
//! Collections are typed and apply their schema-declared indexes when opened.
//! The wrapper only exposes inserts and reads: staff accounts are provisioned
//! once and safety incidents are an append-only audit trail.

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::{Stream, TryStreamExt};
use mongodb::{
    options::{FindOptions, IndexOptions},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::GatewayError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, GatewayError> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| GatewayError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| GatewayError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, GatewayError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Open a collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, GatewayError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), GatewayError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| GatewayError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document.
    ///
    /// `created_at` is kept when the caller already stamped it, so the value
    /// returned to the caller matches what was stored.
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, GatewayError> {
        let now = DateTime::now();
        let metadata = item.mut_metadata();
        if metadata.created_at.is_none() {
            metadata.created_at = Some(now);
        }
        metadata.updated_at = Some(now);

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| GatewayError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| GatewayError::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, GatewayError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| GatewayError::Database(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter, optionally sorted.
    ///
    /// A document that fails to decode fails the whole read.
    pub async fn find_many(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<T>, GatewayError> {
        let options = FindOptions::builder().sort(sort).build();

        let cursor = self
            .inner
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| GatewayError::Database(format!("Find failed: {}", e)))?;

        collect_documents(cursor).await
    }
}

/// Drain a cursor, stopping at the first unreadable document
async fn collect_documents<T, E, S>(cursor: S) -> Result<Vec<T>, GatewayError>
where
    S: Stream<Item = Result<T, E>>,
    E: std::fmt::Display,
{
    cursor.try_collect().await.map_err(|e| {
        error!("Error reading document: {}", e);
        GatewayError::Database(format!("Failed to read document: {}", e))
    })
}

/// True when a database error came from a unique index violation
pub fn is_duplicate_key(err: &GatewayError) -> bool {
    matches!(err, GatewayError::Database(msg) if msg.contains("E11000"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Round trips against a live server need a running MongoDB instance

    #[tokio::test]
    async fn test_collect_documents_keeps_every_document() {
        let cursor = futures_util::stream::iter(vec![Ok::<_, String>(1), Ok(2), Ok(3)]);
        assert_eq!(collect_documents(cursor).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unreadable_document_fails_the_read() {
        let cursor = futures_util::stream::iter(vec![
            Ok(1),
            Err("invalid type: string, expected i64".to_string()),
            Ok(3),
        ]);
        let err = collect_documents::<i32, _, _>(cursor).await.unwrap_err();
        assert!(matches!(err, GatewayError::Database(msg) if msg.contains("expected i64")));
    }

    #[test]
    fn test_duplicate_key_detection() {
        let dup = GatewayError::Database(
            "Insert failed: E11000 duplicate key error collection: pharmagate.safety_incidents".into(),
        );
        assert!(is_duplicate_key(&dup));
        assert!(!is_duplicate_key(&GatewayError::Database("Insert failed: timeout".into())));
        assert!(!is_duplicate_key(&GatewayError::Http("E11000".into())));
    }
}
