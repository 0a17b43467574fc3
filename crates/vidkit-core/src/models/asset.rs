use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::constants::{LEGACY_VIDEO_ASSET_TYPE, VIDEO_ASSET_TYPE};

/// Lifecycle status of a persisted video asset.
///
/// Older records may omit the field entirely; an absent status is treated as
/// ready-equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Preparing,
    WaitingForUpload,
    Waiting,
    Ready,
    Errored,
}

impl Display for AssetStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssetStatus::Preparing => write!(f, "preparing"),
            AssetStatus::WaitingForUpload => write!(f, "waiting_for_upload"),
            AssetStatus::Waiting => write!(f, "waiting"),
            AssetStatus::Ready => write!(f, "ready"),
            AssetStatus::Errored => write!(f, "errored"),
        }
    }
}

/// Persisted content-store record representing one uploaded media file.
///
/// `url` and every URL nested under `data` are sanitized before persistence:
/// the vendor cache-busting query parameter never reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAssetDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "_updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AssetStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_time: Option<f64>,
    /// Full vendor metadata payload from upload or import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl VideoAssetDocument {
    /// Accepts the current asset type and the legacy alias (read paths only).
    pub fn is_asset_type(doc_type: &str) -> bool {
        doc_type == VIDEO_ASSET_TYPE || doc_type == LEGACY_VIDEO_ASSET_TYPE
    }

    /// Ready for playback: explicit `ready`, or a legacy record with no status.
    pub fn is_playable(&self) -> bool {
        matches!(self.status, None | Some(AssetStatus::Ready))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_serializes_snake_case() {
        let status = serde_json::to_value(AssetStatus::WaitingForUpload).unwrap();
        assert_eq!(status, json!("waiting_for_upload"));
    }

    #[test]
    fn test_legacy_type_accepted_on_read() {
        assert!(VideoAssetDocument::is_asset_type("imagekit.videoAsset"));
        assert!(VideoAssetDocument::is_asset_type("imagekit.video"));
        assert!(!VideoAssetDocument::is_asset_type("imagekit.apiKey"));
    }

    #[test]
    fn test_missing_status_is_playable() {
        let asset: VideoAssetDocument = serde_json::from_value(json!({
            "_id": "abc",
            "_type": "imagekit.video",
            "fileId": "f1",
        }))
        .unwrap();
        assert!(asset.is_playable());
        assert_eq!(asset.file_id.as_deref(), Some("f1"));

        let errored: VideoAssetDocument = serde_json::from_value(json!({
            "_id": "abc",
            "_type": "imagekit.videoAsset",
            "status": "errored",
        }))
        .unwrap();
        assert!(!errored.is_playable());
    }
}
