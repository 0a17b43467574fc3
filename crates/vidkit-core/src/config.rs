//! Configuration module
//!
//! Environment-driven configuration for the plugin: vendor API endpoints,
//! the trusted signature endpoint, and HTTP client settings.

use std::env;

const DEFAULT_API_BASE_URL: &str = "https://api.imagekit.io/v1";
const DEFAULT_UPLOAD_BASE_URL: &str = "https://upload.imagekit.io/api/v1";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const LIST_PAGE_SIZE: u32 = 100;

/// Plugin configuration shared by the vendor client and the orchestration layer.
#[derive(Clone, Debug)]
pub struct PluginConfig {
    /// Vendor management API base URL (listing, details, deletion, folders)
    pub api_base_url: String,
    /// Vendor upload API base URL
    pub upload_base_url: String,
    /// Trusted server endpoint issuing short-lived upload signatures.
    /// When unset, signatures are generated locally from the private key.
    pub auth_endpoint: Option<String>,
    pub request_timeout_secs: u64,
    /// Page size for remote file listings
    pub list_page_size: u32,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            auth_endpoint: None,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            list_page_size: LIST_PAGE_SIZE,
        }
    }
}

impl PluginConfig {
    /// Build configuration from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `VIDKIT_API_BASE_URL`, `VIDKIT_UPLOAD_BASE_URL`,
    /// `VIDKIT_AUTH_ENDPOINT`, `VIDKIT_REQUEST_TIMEOUT_SECS`,
    /// `VIDKIT_LIST_PAGE_SIZE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env_or("VIDKIT_API_BASE_URL", defaults.api_base_url),
            upload_base_url: env_or("VIDKIT_UPLOAD_BASE_URL", defaults.upload_base_url),
            auth_endpoint: env::var("VIDKIT_AUTH_ENDPOINT").ok().filter(|v| !v.is_empty()),
            request_timeout_secs: env::var("VIDKIT_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            list_page_size: env::var("VIDKIT_LIST_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.list_page_size),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PluginConfig::default();
        assert_eq!(config.api_base_url, "https://api.imagekit.io/v1");
        assert_eq!(config.upload_base_url, "https://upload.imagekit.io/api/v1");
        assert!(config.auth_endpoint.is_none());
        assert_eq!(config.list_page_size, 100);
    }
}
