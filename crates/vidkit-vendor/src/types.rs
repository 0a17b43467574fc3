//! Request and response shapes for the vendor API.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use vidkit_core::models::{StagedFile, UploadSettings};
use vidkit_core::{
    build_custom_metadata, clean_vendor_url, clean_vendor_urls_in_value,
    parse_returned_custom_metadata,
};

/// A fully configured upload, ready for a transport attempt.
///
/// `custom_metadata` is the normalized serialized form; `None` means the
/// field is omitted from the request entirely.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
    pub folder: String,
    pub is_private: bool,
    pub tags: Vec<String>,
    pub use_unique_filename: bool,
    pub custom_metadata: Option<String>,
}

impl UploadRequest {
    pub fn new(file: StagedFile, settings: &UploadSettings) -> Self {
        Self {
            filename: file.filename,
            content_type: file.content_type,
            bytes: file.bytes,
            folder: settings.folder.clone().unwrap_or_else(|| "/".to_string()),
            is_private: settings.is_private,
            tags: settings.tags.clone(),
            use_unique_filename: settings.use_unique_filename,
            custom_metadata: build_custom_metadata(settings.custom_metadata.as_ref()),
        }
    }
}

/// Vendor upload response. Unknown fields are preserved in `extra` so the
/// full payload survives into the asset document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_private_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_metadata: Option<JsonValue>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl UploadResponse {
    /// Strip the cache-busting parameter from every URL in the response.
    pub fn normalize(mut self) -> Self {
        self.url = clean_vendor_url(&self.url);
        if let Some(thumbnail_url) = self.thumbnail_url.take() {
            self.thumbnail_url = Some(clean_vendor_url(&thumbnail_url));
        }
        let mut extra = JsonValue::Object(std::mem::take(&mut self.extra));
        clean_vendor_urls_in_value(&mut extra);
        if let JsonValue::Object(map) = extra {
            self.extra = map;
        }
        self
    }
}

/// Vendor file descriptor from listing or details endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    pub file_id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_private_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_metadata: Option<JsonValue>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl FileDetails {
    /// Strip the cache-busting parameter from every URL in the descriptor.
    pub fn normalize(mut self) -> Self {
        self.url = clean_vendor_url(&self.url);
        if let Some(thumbnail_url) = self.thumbnail_url.take() {
            self.thumbnail_url = Some(clean_vendor_url(&thumbnail_url));
        }
        let mut extra = JsonValue::Object(std::mem::take(&mut self.extra));
        clean_vendor_urls_in_value(&mut extra);
        if let JsonValue::Object(map) = extra {
            self.extra = map;
        }
        self
    }

    /// Custom metadata as a string map. The vendor returns either a
    /// serialized JSON string or an object depending on the endpoint.
    pub fn custom_metadata_map(&self) -> Option<HashMap<String, String>> {
        self.custom_metadata
            .as_ref()
            .and_then(parse_returned_custom_metadata)
    }

    /// True for video or audio content, by file type or mime prefix.
    pub fn is_av_media(&self) -> bool {
        let file_type = self.file_type.as_deref().unwrap_or_default();
        let mime = self.mime.as_deref().unwrap_or_default();
        file_type.starts_with("video")
            || file_type.starts_with("audio")
            || mime.starts_with("video/")
            || mime.starts_with("audio/")
    }
}

/// Vendor folder descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub folder_path: String,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vidkit_core::models::StagedFile;

    #[test]
    fn test_upload_request_defaults_folder_and_metadata() {
        let file = StagedFile {
            filename: "clip.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            bytes: Bytes::from_static(b"data"),
        };
        let request = UploadRequest::new(file, &UploadSettings::default());
        assert_eq!(request.folder, "/");
        assert!(request.use_unique_filename);
        assert!(request.custom_metadata.is_none());
    }

    #[test]
    fn test_upload_response_normalize_strips_cache_buster() {
        let response: UploadResponse = serde_json::from_value(json!({
            "fileId": "f1",
            "name": "clip.mp4",
            "url": "https://ik.imagekit.io/demo/clip.mp4?updatedAt=5",
            "thumbnailUrl": "https://ik.imagekit.io/demo/t.png?updatedAt=5&tr=n-media",
            "versionInfo": {"id": "v1", "url": "https://ik.imagekit.io/demo/v?updatedAt=9"}
        }))
        .unwrap();

        let normalized = response.normalize();
        assert_eq!(normalized.url, "https://ik.imagekit.io/demo/clip.mp4");
        assert_eq!(
            normalized.thumbnail_url.as_deref(),
            Some("https://ik.imagekit.io/demo/t.png?tr=n-media")
        );
        assert_eq!(
            normalized.extra["versionInfo"]["url"],
            "https://ik.imagekit.io/demo/v"
        );
    }

    #[test]
    fn test_custom_metadata_map_tolerates_both_forms() {
        let as_string: FileDetails = serde_json::from_value(json!({
            "fileId": "f1", "name": "a.mp4", "url": "https://x/a.mp4",
            "customMetadata": "{\"editor\":\"jane\"}",
        }))
        .unwrap();
        assert_eq!(as_string.custom_metadata_map().unwrap()["editor"], "jane");

        let as_object: FileDetails = serde_json::from_value(json!({
            "fileId": "f2", "name": "b.mp4", "url": "https://x/b.mp4",
            "customMetadata": {"editor": "jane"},
        }))
        .unwrap();
        assert_eq!(as_object.custom_metadata_map().unwrap()["editor"], "jane");
    }

    #[test]
    fn test_av_media_filter() {
        let video: FileDetails = serde_json::from_value(json!({
            "fileId": "f1", "name": "a.mp4", "url": "https://x/a.mp4",
            "fileType": "non-image", "mime": "video/mp4",
        }))
        .unwrap();
        assert!(video.is_av_media());

        let audio: FileDetails = serde_json::from_value(json!({
            "fileId": "f2", "name": "a.mp3", "url": "https://x/a.mp3",
            "fileType": "audio",
        }))
        .unwrap();
        assert!(audio.is_av_media());

        let image: FileDetails = serde_json::from_value(json!({
            "fileId": "f3", "name": "a.png", "url": "https://x/a.png",
            "fileType": "image", "mime": "image/png",
        }))
        .unwrap();
        assert!(!image.is_av_media());
    }
}
