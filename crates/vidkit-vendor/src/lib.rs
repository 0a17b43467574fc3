//! Vidkit Vendor Library
//!
//! Client for the ImageKit media API: authenticated uploads (private-key and
//! signature-based), file listing and details, deletion, and folder listing.
//! Responses are normalized before they leave this crate: the vendor's
//! cache-busting URL parameter is stripped everywhere.

pub mod auth;
pub mod client;
pub mod types;

// Re-export commonly used types
pub use auth::{fetch_auth_params, generate_auth_params, AuthParams};
pub use client::ImageKitClient;
pub use types::{FileDetails, Folder, UploadRequest, UploadResponse};
