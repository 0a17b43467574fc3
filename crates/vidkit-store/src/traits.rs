//! Document store abstraction trait
//!
//! This module defines the `DocumentStore` trait the orchestration layer
//! works against, so the core stays testable without the hosting studio's
//! client runtime.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use vidkit_core::PluginError;

/// Document store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Mutation rejected: {0}")]
    MutationRejected(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for PluginError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => PluginError::NotFound(msg),
            other => PluginError::Store(other.to_string()),
        }
    }
}

/// Content-store access used by the plugin.
///
/// Documents are JSON values carrying `_id` and `_type`. Reference patches
/// are atomic from the caller's point of view: either the reference lands or
/// the owning field is left untouched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or fully overwrite a document. Returns the persisted document.
    async fn create_or_replace(&self, document: JsonValue) -> StoreResult<JsonValue>;

    /// Fetch a document by id. A missing document is `Ok(None)`, not an error.
    async fn fetch(&self, id: &str) -> StoreResult<Option<JsonValue>>;

    /// Delete a document by id.
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Set a weak reference to `asset_id` under `{field}.asset` on the owning
    /// document, creating the container if missing, in a single transaction.
    async fn set_asset_reference(
        &self,
        owner_id: &str,
        field: &str,
        asset_id: &str,
    ) -> StoreResult<()>;

    /// Find an existing video asset document by vendor file id. Matches both
    /// the current asset type and the legacy alias.
    async fn find_asset_by_file_id(&self, file_id: &str) -> StoreResult<Option<JsonValue>>;
}
