//! Vidkit Store Library
//!
//! Content-store document access: the `DocumentStore` trait, an HTTP
//! implementation over the store's mutate/query API, and an in-memory fake
//! for tests. The content store itself is an external service; this crate
//! only speaks its documented request/response shapes.

pub mod fake;
pub mod http;
pub mod traits;

// Re-export commonly used types
pub use fake::InMemoryDocumentStore;
pub use http::HttpDocumentStore;
pub use traits::{DocumentStore, StoreError, StoreResult};
