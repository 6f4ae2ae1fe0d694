pub mod dynamo;
pub mod memory;
pub mod paths;
pub mod s3;

pub use dynamo::DynamoStore;
pub use memory::{MemoryBlobStore, MemoryStore};
pub use paths::{CollectionPath, DocPath};
pub use s3::S3BlobStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// One stored document: its top-level JSON fields plus the store-managed
/// revision counter used for optimistic-concurrency updates.
#[derive(Debug, Clone)]
pub struct Document {
    pub fields: Value,
    pub version: u64,
}

impl Document {
    /// Decode the document fields into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.fields.clone()).map_err(|e| StoreError::Serde(e.to_string()))
    }
}

/// Encode a model into the JSON object form the store persists.
pub fn encode<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Serde(e.to_string()))
}

/// Equality filter on a single top-level field.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        FieldFilter {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("write conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("serialization failed: {0}")]
    Serde(String),
}

/// Path-addressed hierarchical document store. Reads never fail on absence
/// (`get` returns `None`); `update` is the optimistic-concurrency write and
/// fails when the document is missing or the expected version does not match.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    /// List every document in a collection, optionally narrowed by an
    /// equality filter. No server-side aggregation; counting is `len()`.
    async fn list(
        &self,
        collection: &CollectionPath,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Create or fully replace the document at `path`.
    async fn upsert(&self, path: &DocPath, fields: Value) -> Result<(), StoreError>;

    /// Merge `fields` into an existing document. Fails with `NotFound` when
    /// the document is missing, or `Conflict` when `expected_version` is
    /// given and no longer matches the stored version.
    async fn update(
        &self,
        path: &DocPath,
        fields: Value,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError>;

    /// Delete the document at `path`. Deleting an absent document is not an error.
    async fn delete(&self, path: &DocPath) -> Result<(), StoreError>;
}

/// Binary blob storage for attachment content. `upload` returns a download
/// locator for the newly written object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, StoreError>;

    async fn download(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Delete the blob at `path`. Deleting an absent blob is not an error.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}
