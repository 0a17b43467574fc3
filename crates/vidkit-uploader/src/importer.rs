//! Remote browser and bulk importer.
//!
//! Lists video/audio files already on the vendor and imports them into asset
//! documents. Import is idempotent per vendor file id and processes items
//! sequentially so a single failure never aborts the rest.

use std::sync::Arc;
use uuid::Uuid;

use vidkit_core::models::VideoAssetDocument;
use vidkit_core::{PluginError, PluginResult};
use vidkit_store::DocumentStore;
use vidkit_vendor::{FileDetails, ImageKitClient};

use crate::asset_writer::AssetWriter;

/// Filters applied to remote listings.
#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    /// Folder paths to include, OR-combined. A file matches when its path
    /// starts with or contains any entry. Empty means no folder filtering.
    pub folder_paths: Vec<String>,
}

impl ListFilters {
    fn matches(&self, file: &FileDetails) -> bool {
        if self.folder_paths.is_empty() {
            return true;
        }
        let file_path = file.file_path.as_deref().unwrap_or_default();
        self.folder_paths
            .iter()
            .any(|folder| file_path.starts_with(folder.as_str()) || file_path.contains(folder.as_str()))
    }
}

/// Per-item result of a bulk import.
#[derive(Debug, Clone)]
pub enum ImportOutcome {
    Created { file_id: String, asset_id: String },
    Skipped { file_id: String },
    Failed { file_id: String, reason: String },
}

/// Result of deleting an asset document and optionally its remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    StoreDeleteFailed,
    VendorDeleteFailed,
}

pub struct VideoImporter {
    vendor: Arc<ImageKitClient>,
    store: Arc<dyn DocumentStore>,
    writer: AssetWriter,
}

impl VideoImporter {
    pub fn new(vendor: Arc<ImageKitClient>, store: Arc<dyn DocumentStore>) -> Self {
        let writer = AssetWriter::new(store.clone());
        Self {
            vendor,
            store,
            writer,
        }
    }

    /// List remote video/audio files, restricted by the folder filters.
    #[tracing::instrument(skip(self, filters))]
    pub async fn list_remote(&self, filters: &ListFilters) -> PluginResult<Vec<FileDetails>> {
        let files = self
            .vendor
            .list_files(&[("fileType", "non-image".to_string())])
            .await?;

        Ok(files
            .into_iter()
            .filter(FileDetails::is_av_media)
            .filter(|file| filters.matches(file))
            .collect())
    }

    /// List vendor folder paths, for building folder filters.
    pub async fn list_folders(&self) -> PluginResult<Vec<String>> {
        let folders = self.vendor.list_folders().await?;
        Ok(folders
            .into_iter()
            .map(|folder| folder.folder_path)
            .filter(|path| !path.is_empty())
            .collect())
    }

    /// Import one remote file into an asset document.
    ///
    /// Idempotent: a file id that already has a matching asset document
    /// reports `Skipped` and never produces a duplicate.
    #[tracing::instrument(skip(self, file), fields(file.id = %file.file_id))]
    pub async fn import_one(&self, file: &FileDetails) -> ImportOutcome {
        match self.store.find_asset_by_file_id(&file.file_id).await {
            Ok(Some(_)) => {
                tracing::debug!("Asset already imported, skipping");
                return ImportOutcome::Skipped {
                    file_id: file.file_id.clone(),
                };
            }
            Ok(None) => {}
            Err(err) => {
                return ImportOutcome::Failed {
                    file_id: file.file_id.clone(),
                    reason: err.to_string(),
                };
            }
        }

        let asset_id = Uuid::new_v4().to_string();
        let asset = self.writer.materialize_remote(&asset_id, file);
        match self.writer.persist(&asset).await {
            Ok(persisted) => ImportOutcome::Created {
                file_id: file.file_id.clone(),
                asset_id: persisted.id,
            },
            Err(err) => ImportOutcome::Failed {
                file_id: file.file_id.clone(),
                reason: err.to_string(),
            },
        }
    }

    /// Import every filtered remote file, sequentially, accumulating
    /// per-item outcomes. One failure does not abort the remaining items.
    #[tracing::instrument(skip(self, filters))]
    pub async fn import_all(&self, filters: &ListFilters) -> PluginResult<Vec<ImportOutcome>> {
        let files = self.list_remote(filters).await?;
        tracing::info!(count = files.len(), "Importing remote files");

        let mut outcomes = Vec::with_capacity(files.len());
        for file in &files {
            outcomes.push(self.import_one(file).await);
        }
        Ok(outcomes)
    }

    /// Fetch normalized details for one remote file.
    pub async fn get_remote_details(&self, file_id: &str) -> PluginResult<FileDetails> {
        self.vendor.get_file(file_id).await
    }

    /// Delete an asset document and, when requested, the remote vendor file.
    ///
    /// A vendor file that is already gone counts as deleted.
    #[tracing::instrument(skip(self, asset), fields(asset.id = %asset.id))]
    pub async fn delete_asset(
        &self,
        asset: &VideoAssetDocument,
        also_delete_remote: bool,
    ) -> DeleteOutcome {
        if let Err(err) = self.store.delete(&asset.id).await {
            tracing::warn!(error = %err, "Failed to delete asset document");
            return DeleteOutcome::StoreDeleteFailed;
        }

        if also_delete_remote {
            if let Some(file_id) = asset.file_id.as_deref() {
                match self.vendor.delete_file(file_id).await {
                    Ok(()) | Err(PluginError::NotFound(_)) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to delete vendor file");
                        return DeleteOutcome::VendorDeleteFailed;
                    }
                }
            }
        }

        DeleteOutcome::Deleted
    }
}
