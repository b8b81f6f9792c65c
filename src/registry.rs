use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("endpoint name must not be empty (got {0:?})")]
    InvalidName(String),
    #[error("endpoint '{0}' not found")]
    NotFound(String),
    #[error("{0}")]
    BadDocument(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Normalized endpoint name: trimmed, lowercase, spaces replaced with underscores
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointName(String);

impl EndpointName {
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let normalized = raw.trim().to_lowercase().replace(' ', "_");
        if normalized.is_empty() {
            return Err(RegistryError::InvalidName(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse document text, reporting malformed JSON as `BadDocument`
pub fn parse_document(text: &str) -> Result<JsonValue, RegistryError> {
    serde_json::from_str(text)
        .map_err(|e| RegistryError::BadDocument(format!("Invalid JSON format: {}", e)))
}

/// Named JSON documents on top of a `DocumentStore`.
///
/// Every operation reloads the snapshot from the store. Mutations hold
/// `update_lock` from load to save, so concurrent updates are applied one
/// after another and none of them is lost. Reads tolerate an unusable
/// snapshot; mutations refuse to run over one they could not read.
pub struct EndpointRegistry {
    store: Arc<dyn DocumentStore>,
    update_lock: Mutex<()>,
}

impl EndpointRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            update_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Store `document` under `name`, replacing any previous document
    pub async fn create_or_replace(
        &self,
        name: &str,
        document: JsonValue,
    ) -> Result<EndpointName, RegistryError> {
        let name = EndpointName::parse(name)?;

        let _guard = self.update_lock.lock().await;
        let mut snapshot = self.store.load_for_update().await?;
        let replaced = snapshot.insert(name.to_string(), document).is_some();
        self.store.save(&snapshot).await?;

        tracing::info!(endpoint = %name, replaced, "Saved endpoint");
        Ok(name)
    }

    /// Create-or-replace from raw management-form input.
    ///
    /// Nothing is written unless both the name and the JSON body are valid.
    pub async fn create_from_text(
        &self,
        name: &str,
        body: &str,
    ) -> Result<EndpointName, RegistryError> {
        let name = EndpointName::parse(name)?;
        if body.trim().is_empty() {
            return Err(RegistryError::BadDocument(
                "JSON body must not be empty".to_string(),
            ));
        }
        let document = parse_document(body)?;
        self.create_or_replace(name.as_str(), document).await
    }

    /// Shallow-merge the top-level keys of `partial` into an existing object document.
    ///
    /// Returns the merged document.
    pub async fn merge_update(
        &self,
        name: &str,
        partial: JsonValue,
    ) -> Result<JsonValue, RegistryError> {
        let name = EndpointName::parse(name)
            .map_err(|_| RegistryError::NotFound(name.trim().to_string()))?;

        let _guard = self.update_lock.lock().await;
        let mut snapshot = self.store.load_for_update().await?;

        let existing = snapshot
            .get_mut(name.as_str())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        let JsonValue::Object(incoming) = partial else {
            return Err(RegistryError::BadDocument(
                "update payload must be a JSON object".to_string(),
            ));
        };
        let JsonValue::Object(target) = &mut *existing else {
            return Err(RegistryError::BadDocument(format!(
                "endpoint '{}' does not hold a JSON object and cannot be merged into",
                name
            )));
        };

        let updated_keys = incoming.len();
        for (key, value) in incoming {
            target.insert(key, value);
        }
        let merged = existing.clone();

        self.store.save(&snapshot).await?;

        tracing::info!(endpoint = %name, updated_keys, "Merged update into endpoint");
        Ok(merged)
    }

    /// Remove `name`; returns false (and writes nothing) when it was not present
    pub async fn delete(&self, name: &str) -> Result<bool, RegistryError> {
        let Ok(name) = EndpointName::parse(name) else {
            return Ok(false);
        };

        let _guard = self.update_lock.lock().await;
        let mut snapshot = self.store.load_for_update().await?;
        if snapshot.shift_remove(name.as_str()).is_none() {
            tracing::debug!(endpoint = %name, "Delete of absent endpoint ignored");
            return Ok(false);
        }
        self.store.save(&snapshot).await?;

        tracing::info!(endpoint = %name, "Deleted endpoint");
        Ok(true)
    }

    pub async fn get(&self, name: &str) -> Option<JsonValue> {
        let name = EndpointName::parse(name).ok()?;
        let mut snapshot = self.store.load().await;
        snapshot.remove(name.as_str())
    }

    /// All endpoints in persisted order
    pub async fn list(&self) -> Vec<(String, JsonValue)> {
        self.store.load().await.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::JsonFileStore;
    use serde_json::json;

    fn memory_registry() -> (EndpointRegistry, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let registry = EndpointRegistry::new(store.clone());
        (registry, store)
    }

    #[test]
    fn test_name_normalization() {
        assert_eq!(EndpointName::parse(" User Info ").unwrap().as_str(), "user_info");
        assert_eq!(EndpointName::parse("ORDERS").unwrap().as_str(), "orders");
        assert_eq!(EndpointName::parse("a  b").unwrap().as_str(), "a__b");
        assert!(matches!(
            EndpointName::parse("   "),
            Err(RegistryError::InvalidName(_))
        ));
        assert!(matches!(EndpointName::parse(""), Err(RegistryError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (registry, _) = memory_registry();
        let documents = [
            json!({"name": "ahmed", "status": "pending"}),
            json!([1, "two", {"three": 3}]),
            json!("just a string"),
            json!(42),
            json!(null),
        ];

        for (i, document) in documents.iter().enumerate() {
            let name = format!("doc{}", i);
            registry.create_or_replace(&name, document.clone()).await.unwrap();
            assert_eq!(registry.get(&name).await.as_ref(), Some(document));
        }
    }

    #[tokio::test]
    async fn test_create_is_idempotent_and_replaces() {
        let (registry, _) = memory_registry();
        let document = json!({"a": 1});

        registry.create_or_replace("one", document.clone()).await.unwrap();
        let after_first = registry.list().await;
        registry.create_or_replace("one", document.clone()).await.unwrap();
        assert_eq!(registry.list().await, after_first);

        // Replace, not merge
        registry.create_or_replace("one", json!({"b": 2})).await.unwrap();
        assert_eq!(registry.get("one").await, Some(json!({"b": 2})));
    }

    #[tokio::test]
    async fn test_normalized_name_is_retrievable() {
        let (registry, _) = memory_registry();
        let name = registry
            .create_or_replace(" User Info ", json!({"id": 7}))
            .await
            .unwrap();

        assert_eq!(name.as_str(), "user_info");
        assert_eq!(registry.get("user_info").await, Some(json!({"id": 7})));
        assert_eq!(registry.get("USER INFO").await, Some(json!({"id": 7})));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let (registry, _) = memory_registry();
        let result = registry.create_or_replace("  ", json!({})).await;
        assert!(matches!(result, Err(RegistryError::InvalidName(_))));
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_from_text_validates_before_writing() {
        let (registry, _) = memory_registry();

        assert!(matches!(
            registry.create_from_text("orders", "   ").await,
            Err(RegistryError::BadDocument(_))
        ));
        assert!(matches!(
            registry.create_from_text("orders", "{not json").await,
            Err(RegistryError::BadDocument(_))
        ));
        assert!(matches!(
            registry.create_from_text("", "{}").await,
            Err(RegistryError::InvalidName(_))
        ));
        assert!(registry.list().await.is_empty());

        let name = registry
            .create_from_text("Orders", r#"{"count": 3}"#)
            .await
            .unwrap();
        assert_eq!(name.as_str(), "orders");
        assert_eq!(registry.get("orders").await, Some(json!({"count": 3})));
    }

    #[tokio::test]
    async fn test_merge_semantics() {
        let (registry, _) = memory_registry();
        registry
            .create_or_replace("userinfo", json!({"a": 1, "b": 2}))
            .await
            .unwrap();

        let merged = registry
            .merge_update("userinfo", json!({"b": 3, "c": 4}))
            .await
            .unwrap();

        assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
        assert_eq!(registry.get("userinfo").await, Some(json!({"a": 1, "b": 3, "c": 4})));
    }

    #[tokio::test]
    async fn test_merge_is_shallow() {
        let (registry, _) = memory_registry();
        registry
            .create_or_replace("cfg", json!({"nested": {"x": 1, "y": 2}, "keep": true}))
            .await
            .unwrap();

        registry
            .merge_update("cfg", json!({"nested": {"x": 10}}))
            .await
            .unwrap();

        assert_eq!(
            registry.get("cfg").await,
            Some(json!({"nested": {"x": 10}, "keep": true}))
        );
    }

    #[tokio::test]
    async fn test_merge_unknown_name_is_not_found() {
        let (registry, _) = memory_registry();
        registry.create_or_replace("real", json!({"a": 1})).await.unwrap();
        let before = registry.list().await;

        let result = registry.merge_update("ghost", json!({"x": 1})).await;
        assert!(matches!(result, Err(RegistryError::NotFound(ref n)) if n == "ghost"));
        assert!(matches!(
            registry.merge_update("   ", json!({"x": 1})).await,
            Err(RegistryError::NotFound(_))
        ));
        assert_eq!(registry.list().await, before);
        assert_eq!(registry.get("ghost").await, None);
    }

    #[tokio::test]
    async fn test_merge_bad_document_leaves_store_unchanged() {
        let (registry, _) = memory_registry();
        registry.create_or_replace("obj", json!({"a": 1})).await.unwrap();
        registry.create_or_replace("list", json!([1, 2])).await.unwrap();
        let before = registry.list().await;

        let payload = parse_document(r#""not-an-object-string-parsed-as-json""#).unwrap();
        assert!(matches!(
            registry.merge_update("obj", payload).await,
            Err(RegistryError::BadDocument(_))
        ));
        assert!(matches!(
            registry.merge_update("list", json!({"a": 1})).await,
            Err(RegistryError::BadDocument(_))
        ));
        assert!(matches!(
            parse_document("{\"a\": "),
            Err(RegistryError::BadDocument(_))
        ));

        assert_eq!(registry.list().await, before);
    }

    #[tokio::test]
    async fn test_delete() {
        let (registry, _) = memory_registry();
        registry.create_or_replace("user_info", json!({"a": 1})).await.unwrap();

        assert!(registry.delete("user_info").await.unwrap());
        assert_eq!(registry.get("user_info").await, None);
        assert!(!registry.delete("user_info").await.unwrap());
        assert!(!registry.delete("").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let (registry, _) = memory_registry();
        for name in ["zulu", "alpha", "mike", "bravo"] {
            registry.create_or_replace(name, json!({"name": name})).await.unwrap();
        }
        registry.delete("mike").await.unwrap();
        registry.create_or_replace("alpha", json!({"replaced": true})).await.unwrap();

        let names: Vec<String> = registry.list().await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["zulu", "alpha", "bravo"]);
    }

    #[tokio::test]
    async fn test_storage_failure_does_not_commit() {
        let (registry, store) = memory_registry();
        registry.create_or_replace("stable", json!({"v": 1})).await.unwrap();

        store.fail_writes(true);
        assert!(matches!(
            registry.create_or_replace("new", json!({})).await,
            Err(RegistryError::Storage(_))
        ));
        assert!(matches!(
            registry.merge_update("stable", json!({"v": 2})).await,
            Err(RegistryError::Storage(_))
        ));
        assert!(matches!(
            registry.delete("stable").await,
            Err(RegistryError::Storage(_))
        ));
        store.fail_writes(false);

        assert_eq!(registry.list().await, vec![("stable".to_string(), json!({"v": 1}))]);
    }

    #[tokio::test]
    async fn test_unreadable_storage_blocks_mutations() {
        let (registry, store) = memory_registry();
        registry.create_or_replace("first", json!({"v": 1})).await.unwrap();
        registry.create_or_replace("second", json!({"v": 2})).await.unwrap();

        store.fail_reads(true);
        assert!(registry.list().await.is_empty());
        assert!(matches!(
            registry.create_or_replace("third", json!({})).await,
            Err(RegistryError::Storage(StoreError::Read { .. }))
        ));
        assert!(matches!(
            registry.merge_update("first", json!({"v": 10})).await,
            Err(RegistryError::Storage(StoreError::Read { .. }))
        ));
        assert!(matches!(
            registry.delete("second").await,
            Err(RegistryError::Storage(StoreError::Read { .. }))
        ));
        store.fail_reads(false);

        assert_eq!(
            registry.list().await,
            vec![
                ("first".to_string(), json!({"v": 1})),
                ("second".to_string(), json!({"v": 2})),
            ]
        );
    }

    #[tokio::test]
    async fn test_persists_through_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("endpoints.json");

        let registry = EndpointRegistry::new(Arc::new(JsonFileStore::new(&path)));
        registry.create_or_replace("orders", json!({"open": 2})).await.unwrap();
        registry.merge_update("orders", json!({"closed": 5})).await.unwrap();

        let reopened = EndpointRegistry::new(Arc::new(JsonFileStore::new(&path)));
        assert_eq!(reopened.get("orders").await, Some(json!({"open": 2, "closed": 5})));
    }

    #[tokio::test]
    async fn test_corrupt_storage_then_create_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("endpoints.json");
        std::fs::write(&path, b"\x00\xffgarbage").unwrap();

        let registry = EndpointRegistry::new(Arc::new(JsonFileStore::new(&path)));
        assert!(registry.list().await.is_empty());
        registry.create_or_replace("fresh", json!({"ok": true})).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: JsonValue = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, json!({"fresh": {"ok": true}}));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_merges_lose_no_updates() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(EndpointRegistry::new(Arc::new(JsonFileStore::new(
            dir.path().join("endpoints.json"),
        ))));
        registry.create_or_replace("shared", json!({})).await.unwrap();

        let n = 32;
        let mut tasks = Vec::new();
        for i in 0..n {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let mut partial = serde_json::Map::new();
                partial.insert(format!("key{}", i), json!(i));
                registry
                    .merge_update("shared", JsonValue::Object(partial))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let document = registry.get("shared").await.unwrap();
        let object = document.as_object().unwrap();
        assert_eq!(object.len(), n);
        for i in 0..n {
            assert_eq!(object.get(&format!("key{}", i)), Some(&json!(i)));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_of_different_names() {
        let (registry, _) = memory_registry();
        let registry = Arc::new(registry);

        let mut tasks = Vec::new();
        for i in 0..16 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                registry
                    .create_or_replace(&format!("endpoint{}", i), json!({"i": i}))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(registry.list().await.len(), 16);
    }
}
