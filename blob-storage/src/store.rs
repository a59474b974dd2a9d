use std::fmt::{self, Display, Formatter};

use async_trait::async_trait;

use crate::config::StorageConfig;
use crate::error::StoreResult;
use crate::local_store::LocalBlobStore;
use crate::s3_store::{create_s3_client, S3BlobStore};

/// Which substrate a store writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    File,
    S3,
}

impl Display for StoreKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::File => f.write_str("FILE"),
            StoreKind::S3 => f.write_str("S3"),
        }
    }
}

/// Storing, fetching, removing and enumerating objects by name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `data` under `name`, replacing any existing object.
    async fn put(&self, name: &str, data: &[u8]) -> StoreResult<()>;

    /// Retrieves the full content stored under `name`.
    async fn get(&self, name: &str) -> StoreResult<Vec<u8>>;

    async fn delete(&self, name: &str) -> StoreResult<()>;

    /// Names of every stored object, in backend order.
    async fn list(&self) -> StoreResult<Vec<String>>;

    fn kind(&self) -> StoreKind;
}

#[derive(Debug, Clone)]
pub enum BlobStores {
    Local(LocalBlobStore),
    S3(S3BlobStore),
}

impl BlobStores {
    /// Builds the single store the process serves from.
    pub async fn connect(config: &StorageConfig) -> StoreResult<Self> {
        match config {
            StorageConfig::Filesystem { root } => Ok(BlobStores::Local(LocalBlobStore::open(root).await?)),
            StorageConfig::ObjectStore(settings) => {
                let client = create_s3_client(settings).await;
                Ok(BlobStores::S3(S3BlobStore::new(client, settings.bucket.clone())))
            }
        }
    }

    /// Returns a reference to the inner value as a trait object.
    pub fn as_trait(&self) -> &dyn BlobStore {
        match self {
            BlobStores::Local(a) => a,
            BlobStores::S3(b) => b,
        }
    }
}
