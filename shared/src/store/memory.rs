use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{BlobStore, CollectionPath, DocPath, Document, DocumentStore, FieldFilter, StoreError};

#[derive(Debug, Clone)]
struct StoredDoc {
    fields: Value,
    version: u64,
}

/// In-memory document store for tests. Counts successful mutations so tests
/// can assert that an aborted operation wrote nothing, and can be told to
/// fail operations on paths under a given prefix.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, StoredDoc>>,
    writes: AtomicU64,
    fail_prefixes: Mutex<Vec<String>>,
    fail_write_prefixes: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful upsert/update/delete calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn doc_count(&self) -> usize {
        self.docs.lock().await.len()
    }

    /// Fail every operation on paths under `prefix` with `Unavailable`.
    pub async fn fail_on_prefix(&self, prefix: &str) {
        self.fail_prefixes.lock().await.push(prefix.to_string());
    }

    /// Fail mutating operations on paths under `prefix` with `Unavailable`.
    pub async fn fail_writes_on_prefix(&self, prefix: &str) {
        self.fail_write_prefixes.lock().await.push(prefix.to_string());
    }

    async fn check_failure(&self, path: &str, is_write: bool) -> Result<(), StoreError> {
        for prefix in self.fail_prefixes.lock().await.iter() {
            if path.starts_with(prefix.as_str()) {
                return Err(StoreError::Unavailable(format!(
                    "injected failure for {}",
                    path
                )));
            }
        }
        if is_write {
            for prefix in self.fail_write_prefixes.lock().await.iter() {
                if path.starts_with(prefix.as_str()) {
                    return Err(StoreError::Unavailable(format!(
                        "injected write failure for {}",
                        path
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        let key = path.to_string();
        self.check_failure(&key, false).await?;
        let docs = self.docs.lock().await;
        Ok(docs.get(&key).map(|doc| Document {
            fields: doc.fields.clone(),
            version: doc.version,
        }))
    }

    async fn list(
        &self,
        collection: &CollectionPath,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Document>, StoreError> {
        let prefix = format!("{}/", collection);
        self.check_failure(&collection.to_string(), false).await?;
        let docs = self.docs.lock().await;
        let mut out = Vec::new();
        for (key, doc) in docs.iter() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            if rest.contains('/') {
                continue;
            }
            if let Some(filter) = filter {
                if doc.fields.get(&filter.field) != Some(&filter.value) {
                    continue;
                }
            }
            out.push(Document {
                fields: doc.fields.clone(),
                version: doc.version,
            });
        }
        Ok(out)
    }

    async fn upsert(&self, path: &DocPath, fields: Value) -> Result<(), StoreError> {
        let key = path.to_string();
        self.check_failure(&key, true).await?;
        if !fields.is_object() {
            return Err(StoreError::Serde(format!(
                "document fields for {} must be a JSON object",
                key
            )));
        }
        let mut docs = self.docs.lock().await;
        docs.insert(key, StoredDoc { fields, version: 1 });
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(
        &self,
        path: &DocPath,
        fields: Value,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError> {
        let key = path.to_string();
        self.check_failure(&key, true).await?;
        let Value::Object(new_fields) = fields else {
            return Err(StoreError::Serde(format!(
                "document fields for {} must be a JSON object",
                key
            )));
        };
        let mut docs = self.docs.lock().await;
        let Some(doc) = docs.get_mut(&key) else {
            return Err(StoreError::NotFound(key));
        };
        if let Some(expected) = expected_version {
            if doc.version != expected {
                return Err(StoreError::Conflict(format!(
                    "version mismatch for {} (expected {}, found {})",
                    key, expected, doc.version
                )));
            }
        }
        let Value::Object(stored) = &mut doc.fields else {
            return Err(StoreError::Serde(format!(
                "stored document at {} is not a JSON object",
                key
            )));
        };
        for (field, value) in new_fields {
            stored.insert(field, value);
        }
        doc.version += 1;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        let key = path.to_string();
        self.check_failure(&key, true).await?;
        self.docs.lock().await.remove(&key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory blob store for tests. Locators take the form `memory://{path}`.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_prefixes: Mutex<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.blobs.lock().await.contains_key(path)
    }

    pub async fn blob_count(&self) -> usize {
        self.blobs.lock().await.len()
    }

    /// Fail every blob operation on paths under `prefix` with `Unavailable`.
    pub async fn fail_on_prefix(&self, prefix: &str) {
        self.fail_prefixes.lock().await.push(prefix.to_string());
    }

    async fn check_failure(&self, path: &str) -> Result<(), StoreError> {
        for prefix in self.fail_prefixes.lock().await.iter() {
            if path.starts_with(prefix.as_str()) {
                return Err(StoreError::Unavailable(format!(
                    "injected blob failure for {}",
                    path
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        self.check_failure(path).await?;
        self.blobs.lock().await.insert(path.to_string(), bytes);
        Ok(format!("memory://{}", path))
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.check_failure(path).await?;
        self.blobs
            .lock()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.check_failure(path).await?;
        self.blobs.lock().await.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::paths;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = MemoryStore::new();
        let path = paths::project("p1");
        store
            .upsert(&path, json!({"name": "Alpha", "archived": false}))
            .await
            .unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Alpha");
        assert_eq!(doc.version, 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn update_merges_and_bumps_version() {
        let store = MemoryStore::new();
        let path = paths::project("p1");
        store
            .upsert(&path, json!({"name": "Alpha", "archived": false}))
            .await
            .unwrap();
        store
            .update(&path, json!({"archived": true}), None)
            .await
            .unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Alpha");
        assert_eq!(doc.fields["archived"], true);
        assert_eq!(doc.version, 2);
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(&paths::project("nope"), json!({"name": "x"}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let store = MemoryStore::new();
        let path = paths::project("p1");
        store.upsert(&path, json!({"name": "Alpha"})).await.unwrap();
        store
            .update(&path, json!({"name": "Beta"}), Some(1))
            .await
            .unwrap();

        let err = store
            .update(&path, json!({"name": "Gamma"}), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_scopes_to_one_collection_level() {
        let store = MemoryStore::new();
        store
            .upsert(&paths::issue("p1", "i1"), json!({"name": "A", "archived": false}))
            .await
            .unwrap();
        store
            .upsert(&paths::issue("p1", "i2"), json!({"name": "B", "archived": true}))
            .await
            .unwrap();
        store
            .upsert(&paths::task("p1", "i1", "t1"), json!({"title": "deep"}))
            .await
            .unwrap();
        store
            .upsert(&paths::issue("p2", "i3"), json!({"name": "C", "archived": false}))
            .await
            .unwrap();

        let all = store.list(&paths::issues("p1"), None).await.unwrap();
        assert_eq!(all.len(), 2);

        let active = store
            .list(&paths::issues("p1"), Some(&FieldFilter::eq("archived", false)))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].fields["name"], "A");
    }

    #[tokio::test]
    async fn injected_failures_surface_as_unavailable() {
        let store = MemoryStore::new();
        let path = paths::issue("p1", "i1");
        store.upsert(&path, json!({"name": "A"})).await.unwrap();

        store.fail_on_prefix("projects/p1").await;
        let err = store.get(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn write_only_failures_leave_reads_alone() {
        let store = MemoryStore::new();
        let path = paths::issue("p1", "i1");
        store.upsert(&path, json!({"name": "A"})).await.unwrap();

        store.fail_writes_on_prefix("projects/p1").await;
        assert!(store.get(&path).await.unwrap().is_some());
        let err = store
            .update(&path, json!({"name": "B"}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn blob_store_round_trips_and_deletes() {
        let blobs = MemoryBlobStore::new();
        let locator = blobs.upload("projects/p1/a.txt", b"hello".to_vec()).await.unwrap();
        assert_eq!(locator, "memory://projects/p1/a.txt");
        assert_eq!(blobs.download("projects/p1/a.txt").await.unwrap(), b"hello");

        blobs.delete("projects/p1/a.txt").await.unwrap();
        assert!(!blobs.contains("projects/p1/a.txt").await);
        assert!(matches!(
            blobs.download("projects/p1/a.txt").await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }
}
