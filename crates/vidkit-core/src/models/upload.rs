use bytes::Bytes;
use serde_json::{Map, Value as JsonValue};

use super::VideoAssetDocument;

/// A user-selected upload source awaiting configuration.
///
/// Transient and in-memory only; consumed exactly once by commit and
/// discarded on reset, completion, or error.
#[derive(Debug, Clone)]
pub enum StagedUpload {
    File(StagedFile),
    Url { url: String },
}

#[derive(Debug, Clone)]
pub struct StagedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl StagedFile {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// User-adjustable settings layered onto a staged upload.
///
/// Immutable once committed to the orchestrator.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Destination folder, defaulting to the vendor root.
    pub folder: Option<String>,
    pub is_private: bool,
    pub tags: Vec<String>,
    pub use_unique_filename: bool,
    /// String-to-string metadata after normalization; object/array values
    /// are dropped when the request is built.
    pub custom_metadata: Option<Map<String, JsonValue>>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            folder: None,
            is_private: false,
            tags: Vec::new(),
            use_unique_filename: true,
            custom_metadata: None,
        }
    }
}

/// Discrete events emitted by an upload session, in order: one source
/// descriptor, zero or more monotonically non-decreasing progress updates,
/// then exactly one terminal `Success` or `Error`.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// A file upload started; `assigned_id` is the id the asset document
    /// will be created under.
    File { filename: String, assigned_id: String },
    /// A URL upload started.
    Url { url: String },
    Progress { percent: u8 },
    Success { asset: Box<VideoAssetDocument> },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_to_unique_filenames() {
        let settings = UploadSettings::default();
        assert!(settings.use_unique_filename);
        assert!(!settings.is_private);
        assert!(settings.folder.is_none());
    }

    #[test]
    fn test_empty_staged_file_detected() {
        let staged = StagedFile {
            filename: "clip.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            bytes: Bytes::new(),
        };
        assert!(staged.is_empty());
    }
}
