use crate::error::{BlobError, BlobResult, StorageError};
use crate::extension::extension_of;
use crate::name::BlobName;
use crate::store::{BlobStore, BlobStores, StoreKind};

/// A blob read back from storage after its digest was re-verified.
#[derive(Debug, Clone)]
pub struct BlobContent {
    pub name: BlobName,
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Upload, view, delete and list over whichever store the process runs with.
///
/// Every read and delete re-hashes the stored bytes and treats a digest
/// mismatch as if the blob were absent. There is no locking: concurrent
/// uploads of one name carry identical bytes, while a delete racing a view
/// of the same name is best effort.
#[derive(Debug, Clone)]
pub struct BlobService {
    stores: BlobStores,
}

impl BlobService {
    pub fn new(stores: BlobStores) -> Self {
        Self { stores }
    }

    fn store(&self) -> &dyn BlobStore {
        self.stores.as_trait()
    }

    pub fn kind(&self) -> StoreKind {
        self.store().kind()
    }

    /// Lists stored names, sorted. A failing backend yields an empty listing;
    /// the failure is only logged.
    pub async fn list_blobs(&self) -> Vec<String> {
        let kind = self.kind();
        tracing::info!("{}: Listing blobs", kind);
        match self.store().list().await {
            Ok(mut names) => {
                names.sort();
                names
            }
            Err(e) => {
                tracing::error!(error = %e, "{}: Unable to list blobs", kind);
                Vec::new()
            }
        }
    }

    /// Stores `data` under its content address. Filenames without an allowed
    /// extension are rejected before anything is hashed or written.
    pub async fn upload(&self, original_filename: &str, data: &[u8]) -> BlobResult<BlobName> {
        let Some(extension) = extension_of(original_filename) else {
            tracing::info!(filename = original_filename, "Ignoring upload with disallowed file type");
            return Err(BlobError::rejected(original_filename));
        };
        let name = BlobName::for_content(data, &extension);

        if let Err(e) = self.store().put(name.as_str(), data).await {
            tracing::error!(error = %e, "{}: Unable to write {}", self.kind(), name);
            return Err(BlobError::Storage(e));
        }
        tracing::info!("{}: Write: {} ({} bytes)", self.kind(), name, data.len());
        Ok(name)
    }

    /// Fetches a blob, serving it only if its bytes still hash to its name.
    pub async fn view(&self, requested: &str) -> BlobResult<BlobContent> {
        let (name, data) = self.fetch_verified("read", requested).await?;
        tracing::info!("{}: Read: {}", self.kind(), name);
        let content_type = name.content_type();
        Ok(BlobContent {
            name,
            data,
            content_type,
        })
    }

    /// Deletes a blob, but only one whose bytes still hash to its name.
    pub async fn delete(&self, requested: &str) -> BlobResult<()> {
        let (name, _) = self.fetch_verified("delete", requested).await?;
        if let Err(e) = self.store().delete(name.as_str()).await {
            return Err(self.storage_failure("delete", &name, e));
        }
        tracing::info!("{}: Delete: {}", self.kind(), name);
        Ok(())
    }

    async fn fetch_verified(&self, op: &'static str, requested: &str) -> BlobResult<(BlobName, Vec<u8>)> {
        let Some(name) = BlobName::parse(requested) else {
            tracing::debug!(name = requested, "Not a blob name");
            return Err(BlobError::not_found(requested));
        };
        let data = match self.store().get(name.as_str()).await {
            Ok(data) => data,
            Err(e) => return Err(self.storage_failure(op, &name, e)),
        };
        if !name.matches(&data) {
            tracing::warn!("{}: Digest mismatch for {}, refusing to {}", self.kind(), name, op);
            return Err(BlobError::not_found(requested));
        }
        Ok((name, data))
    }

    fn storage_failure(&self, op: &'static str, name: &BlobName, err: StorageError) -> BlobError {
        match err {
            StorageError::NotFound { .. } => tracing::debug!("{}: {} not found", self.kind(), name),
            ref e => tracing::error!(error = %e, "{}: Unable to {} {}", self.kind(), op, name),
        }
        err.into()
    }
}
