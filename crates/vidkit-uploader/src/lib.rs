//! Vidkit Uploader Library
//!
//! This crate is the orchestration layer: it drives a single upload through
//! staging, configuration, transport selection, progress, and completion,
//! and hosts the surrounding services (secrets provider, asset document
//! writer, remote browser / bulk importer).

pub mod asset_writer;
pub mod importer;
pub mod orchestrator;
pub mod secrets;
pub mod transport;

// Re-export commonly used types
pub use asset_writer::AssetWriter;
pub use importer::{DeleteOutcome, ImportOutcome, ListFilters, VideoImporter};
pub use orchestrator::{OwnerLink, UploadOrchestrator, UploadState};
pub use secrets::SecretsProvider;
pub use transport::{
    DirectTransport, FallbackTransport, ProgressSender, TransportChain, UploadTransport,
    VendorCleanup,
};
