//! Content-addressed image storage.
//!
//! Every blob is stored as `<md5 hex>.<extension>` on either a local
//! directory or an S3-compatible bucket, and every read or delete re-hashes
//! the stored bytes before acting on them.

pub mod config;
pub mod digest;
pub mod error;
pub mod extension;
pub mod local_store;
pub mod name;
pub mod s3_store;
pub mod service;
pub mod store;

pub use config::{ObjectStoreSettings, StorageConfig, StorageSettings};
pub use error::{BlobError, BlobResult, StorageError, StoreResult};
pub use name::BlobName;
pub use service::{BlobContent, BlobService};
pub use store::{BlobStore, BlobStores, StoreKind};
