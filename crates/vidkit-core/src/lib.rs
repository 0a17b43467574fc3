//! Vidkit Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! normalization utilities shared across all vidkit components.

pub mod clean_url;
pub mod config;
pub mod constants;
pub mod error;
pub mod metadata;
pub mod models;
pub mod telemetry;

// Re-export commonly used types
pub use clean_url::{clean_vendor_url, clean_vendor_urls_in_value};
pub use config::PluginConfig;
pub use error::{PluginError, PluginResult};
pub use metadata::{build_custom_metadata, parse_returned_custom_metadata};
