//! In-memory document store for tests.
//!
//! Supports failure injection for mutations and silently dropping named
//! fields on write, which simulates a store rejecting part of a document.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use vidkit_core::models::VideoAssetDocument;

use crate::traits::{DocumentStore, StoreError, StoreResult};

/// `InMemoryDocumentStore` is an in-memory implementation of the
/// `DocumentStore` trait for testing purposes.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<HashMap<String, JsonValue>>>,
    fail_mutations: Arc<Mutex<bool>>,
    fail_next_mutations: Arc<Mutex<u32>>,
    dropped_fields: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent mutation fail.
    pub fn fake_fail_mutations(&self) {
        *self.fail_mutations.lock().unwrap() = true;
    }

    /// Restore normal mutation behavior.
    pub fn fake_reset_mutations(&self) {
        *self.fail_mutations.lock().unwrap() = false;
        *self.fail_next_mutations.lock().unwrap() = 0;
    }

    /// Make only the next `count` mutations fail.
    pub fn fake_fail_next_mutations(&self, count: u32) {
        *self.fail_next_mutations.lock().unwrap() = count;
    }

    /// Silently drop a named top-level field from every written document.
    pub fn fake_drop_field(&self, field: &str) {
        self.dropped_fields.lock().unwrap().insert(field.to_string());
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    fn check_mutations_allowed(&self) -> StoreResult<()> {
        if *self.fail_mutations.lock().unwrap() {
            return Err(StoreError::MutationRejected(
                "Simulated mutation failure".to_string(),
            ));
        }
        let mut remaining = self.fail_next_mutations.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(StoreError::MutationRejected(
                "Simulated mutation failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_or_replace(&self, document: JsonValue) -> StoreResult<JsonValue> {
        self.check_mutations_allowed()?;

        let id = document
            .get("_id")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| StoreError::InvalidDocument("document is missing _id".to_string()))?
            .to_string();

        let mut stored = document;
        {
            let dropped = self.dropped_fields.lock().unwrap();
            if let JsonValue::Object(map) = &mut stored {
                map.retain(|key, _| !dropped.contains(key));
            }
        }

        self.documents.lock().unwrap().insert(id, stored.clone());
        Ok(stored)
    }

    async fn fetch(&self, id: &str) -> StoreResult<Option<JsonValue>> {
        Ok(self.documents.lock().unwrap().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.check_mutations_allowed()?;
        self.documents.lock().unwrap().remove(id);
        Ok(())
    }

    async fn set_asset_reference(
        &self,
        owner_id: &str,
        field: &str,
        asset_id: &str,
    ) -> StoreResult<()> {
        self.check_mutations_allowed()?;

        let mut documents = self.documents.lock().unwrap();
        let owner = documents
            .get_mut(owner_id)
            .ok_or_else(|| StoreError::NotFound(owner_id.to_string()))?;

        let container = owner
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidDocument(owner_id.to_string()))?
            .entry(field.to_string())
            .or_insert_with(|| json!({}));

        container["asset"] = json!({
            "_type": "reference",
            "_weak": true,
            "_ref": asset_id,
        });
        Ok(())
    }

    async fn find_asset_by_file_id(&self, file_id: &str) -> StoreResult<Option<JsonValue>> {
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .values()
            .find(|doc| {
                doc.get("_type")
                    .and_then(JsonValue::as_str)
                    .is_some_and(VideoAssetDocument::is_asset_type)
                    && doc.get("fileId").and_then(JsonValue::as_str) == Some(file_id)
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_reference_patch() {
        let store = InMemoryDocumentStore::new();
        store
            .create_or_replace(json!({"_id": "post-1", "_type": "post"}))
            .await
            .unwrap();
        store
            .create_or_replace(json!({
                "_id": "asset-1",
                "_type": "imagekit.videoAsset",
                "fileId": "f1",
            }))
            .await
            .unwrap();

        store
            .set_asset_reference("post-1", "video", "asset-1")
            .await
            .unwrap();

        let owner = store.fetch("post-1").await.unwrap().unwrap();
        assert_eq!(owner["video"]["asset"]["_ref"], "asset-1");
        assert_eq!(owner["video"]["asset"]["_weak"], true);

        let found = store.find_asset_by_file_id("f1").await.unwrap().unwrap();
        assert_eq!(found["_id"], "asset-1");
        assert!(store.find_asset_by_file_id("f2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reference_patch_missing_owner_fails() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .set_asset_reference("nope", "video", "asset-1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_dropped_field_simulation() {
        let store = InMemoryDocumentStore::new();
        store.fake_drop_field("privateKey");
        let stored = store
            .create_or_replace(json!({
                "_id": "secrets.imagekit",
                "publicKey": "pk",
                "privateKey": "sk",
            }))
            .await
            .unwrap();
        assert!(stored.get("privateKey").is_none());
        assert_eq!(stored["publicKey"], "pk");
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryDocumentStore::new();
        store.fake_fail_mutations();
        assert!(store
            .create_or_replace(json!({"_id": "x"}))
            .await
            .is_err());
        store.fake_reset_mutations();
        assert!(store
            .create_or_replace(json!({"_id": "x"}))
            .await
            .is_ok());
    }
}
