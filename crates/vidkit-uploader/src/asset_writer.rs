//! Asset document writer.
//!
//! Maps normalized vendor responses onto persisted asset documents and links
//! them into owning documents via a weak reference patch.

use chrono::Utc;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use vidkit_core::clean_vendor_urls_in_value;
use vidkit_core::constants::VIDEO_ASSET_TYPE;
use vidkit_core::models::{AssetStatus, VideoAssetDocument};
use vidkit_core::{clean_vendor_url, PluginError, PluginResult};
use vidkit_store::DocumentStore;
use vidkit_vendor::{FileDetails, UploadResponse};

#[derive(Clone)]
pub struct AssetWriter {
    store: Arc<dyn DocumentStore>,
}

impl AssetWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Build the asset document for a completed upload.
    ///
    /// Always `ready`, always `thumb_time: 0`; the full vendor response is
    /// preserved under `data` with every URL sanitized.
    pub fn materialize(&self, asset_id: &str, upload: &UploadResponse) -> VideoAssetDocument {
        let now = Utc::now();
        let data = sanitized_value(upload);

        VideoAssetDocument {
            id: asset_id.to_string(),
            doc_type: VIDEO_ASSET_TYPE.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
            status: Some(AssetStatus::Ready),
            file_id: Some(upload.file_id.clone()),
            url: Some(clean_vendor_url(&upload.url)),
            filename: Some(upload.name.clone()),
            thumb_time: Some(0.0),
            data: Some(data),
        }
    }

    /// Build the asset document for a remote file imported without an upload.
    pub fn materialize_remote(&self, asset_id: &str, details: &FileDetails) -> VideoAssetDocument {
        let now = Utc::now();
        let data = sanitized_value(details);

        VideoAssetDocument {
            id: asset_id.to_string(),
            doc_type: VIDEO_ASSET_TYPE.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
            status: Some(AssetStatus::Ready),
            file_id: Some(details.file_id.clone()),
            url: Some(clean_vendor_url(&details.url)),
            filename: Some(details.name.clone()),
            thumb_time: Some(0.0),
            data: Some(data),
        }
    }

    /// Persist an asset document.
    pub async fn persist(&self, asset: &VideoAssetDocument) -> PluginResult<VideoAssetDocument> {
        let document = serde_json::to_value(asset)?;
        let persisted = self.store.create_or_replace(document).await?;
        serde_json::from_value(persisted).map_err(PluginError::from)
    }

    /// Persist an asset document, then set the weak reference on the owning
    /// document. The reference patch is a single transaction: either it lands
    /// or the owning field is untouched.
    #[tracing::instrument(skip(self, asset), fields(asset.id = %asset.id))]
    pub async fn persist_and_link(
        &self,
        asset: &VideoAssetDocument,
        owner_id: &str,
        field: &str,
    ) -> PluginResult<VideoAssetDocument> {
        let persisted = self.persist(asset).await?;
        self.store
            .set_asset_reference(owner_id, field, &persisted.id)
            .await?;
        tracing::info!(owner = owner_id, field = field, "Linked asset into document");
        Ok(persisted)
    }
}

fn sanitized_value<T: serde::Serialize>(payload: &T) -> JsonValue {
    let mut value = serde_json::to_value(payload).unwrap_or(JsonValue::Null);
    clean_vendor_urls_in_value(&mut value);
    value
}
