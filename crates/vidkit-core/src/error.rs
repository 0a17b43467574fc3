//! Error types module
//!
//! All failures surfaced by the plugin are unified under the `PluginError`
//! enum. Transport-level failures are classified from the vendor's HTTP
//! status so that each terminal failure carries a distinct, human-readable
//! message the host UI can show as-is.

use std::io;

/// Result type for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("ImageKit credentials are not configured")]
    CredentialsMissing,

    #[error("Invalid ImageKit credentials")]
    CredentialsInvalid,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Usage limit exceeded: {0}")]
    QuotaExceeded(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Vendor delete failed: {0}")]
    VendorDeleteFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Content store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PluginError {
    /// Classify a vendor HTTP status into the error taxonomy.
    ///
    /// Statuses without a dedicated variant collapse into `UploadFailed`
    /// carrying the transport message verbatim.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => PluginError::Unauthorized(message),
            402 => PluginError::QuotaExceeded(message),
            404 => PluginError::NotFound(message),
            413 => PluginError::PayloadTooLarge(message),
            415 => PluginError::UnsupportedMediaType(message),
            _ => PluginError::UploadFailed(message),
        }
    }

    /// Machine-readable error code (e.g. "QUOTA_EXCEEDED")
    pub fn error_code(&self) -> &'static str {
        match self {
            PluginError::CredentialsMissing => "CREDENTIALS_MISSING",
            PluginError::CredentialsInvalid => "CREDENTIALS_INVALID",
            PluginError::InvalidUrl(_) => "INVALID_URL",
            PluginError::Unauthorized(_) => "UNAUTHORIZED",
            PluginError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            PluginError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            PluginError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            PluginError::UploadFailed(_) => "UPLOAD_FAILED",
            PluginError::VendorDeleteFailed(_) => "VENDOR_DELETE_FAILED",
            PluginError::NotFound(_) => "NOT_FOUND",
            PluginError::Store(_) => "STORE_ERROR",
            PluginError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message (may differ from the internal error message)
    pub fn client_message(&self) -> String {
        match self {
            PluginError::CredentialsMissing => {
                "ImageKit credentials are not configured. Add your API keys in the plugin setup."
                    .to_string()
            }
            PluginError::CredentialsInvalid => {
                "Invalid ImageKit credentials. Please check your API keys.".to_string()
            }
            PluginError::InvalidUrl(ref msg) => msg.clone(),
            PluginError::Unauthorized(_) => {
                "Invalid ImageKit credentials. Please check your API keys.".to_string()
            }
            PluginError::QuotaExceeded(_) => {
                "ImageKit monthly usage limit exceeded. Please upgrade your plan or wait for the next billing cycle."
                    .to_string()
            }
            PluginError::PayloadTooLarge(_) => {
                "File size exceeds the maximum allowed limit.".to_string()
            }
            PluginError::UnsupportedMediaType(_) => {
                "File format is not supported. Please use a supported video format.".to_string()
            }
            PluginError::UploadFailed(ref msg) => format!("Upload failed: {}", msg),
            PluginError::VendorDeleteFailed(ref msg) => {
                format!("Failed to delete the remote file: {}", msg)
            }
            PluginError::NotFound(ref msg) => msg.clone(),
            PluginError::Store(_) => "Failed to access the content store".to_string(),
            PluginError::Internal(_) => "Internal plugin error".to_string(),
        }
    }

    /// Whether the failure may succeed if the whole operation is restarted
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PluginError::UploadFailed(_) | PluginError::Store(_) | PluginError::Internal(_)
        )
    }
}

impl From<io::Error> for PluginError {
    fn from(err: io::Error) -> Self {
        PluginError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(err: serde_json::Error) -> Self {
        PluginError::Internal(format!("JSON error: {}", err))
    }
}

impl From<anyhow::Error> for PluginError {
    fn from(err: anyhow::Error) -> Self {
        PluginError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            PluginError::from_status(401, "denied"),
            PluginError::Unauthorized(_)
        ));
        assert!(matches!(
            PluginError::from_status(402, "limit"),
            PluginError::QuotaExceeded(_)
        ));
        assert!(matches!(
            PluginError::from_status(413, "big"),
            PluginError::PayloadTooLarge(_)
        ));
        assert!(matches!(
            PluginError::from_status(415, "what"),
            PluginError::UnsupportedMediaType(_)
        ));
        assert!(matches!(
            PluginError::from_status(500, "boom"),
            PluginError::UploadFailed(_)
        ));
    }

    #[test]
    fn test_quota_message_mentions_usage_limit() {
        let err = PluginError::from_status(402, "Payment required");
        let msg = err.client_message().to_lowercase();
        assert!(msg.contains("usage limit"), "got: {}", msg);
        assert_eq!(err.error_code(), "QUOTA_EXCEEDED");
    }

    #[test]
    fn test_generic_failure_wraps_transport_message() {
        let err = PluginError::from_status(500, "connection reset");
        assert_eq!(err.client_message(), "Upload failed: connection reset");
    }
}
