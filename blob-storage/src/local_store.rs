use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{StorageError, StoreResult};
use crate::store::{BlobStore, StoreKind};

/// Stores objects as files directly under one directory.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    base_path: PathBuf,
}

const TEMP_SUFFIX: &str = ".upload";

fn is_temp_upload(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

/// Removes its temp file on drop unless the upload was renamed into place.
struct TempUpload {
    path: PathBuf,
    committed: bool,
}

impl TempUpload {
    fn new(base_path: &Path) -> Self {
        Self {
            path: base_path.join(format!(".{}{}", Uuid::new_v4(), TEMP_SUFFIX)),
            committed: false,
        }
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl LocalBlobStore {
    /// Opens the store at `base_path`, creating the directory if needed and
    /// removing uploads left behind by an earlier process.
    pub async fn open(base_path: impl AsRef<Path>) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        let location = base_path.display().to_string();
        if !fs::try_exists(&base_path).await.unwrap_or(false) {
            tracing::info!(path = %location, "upload folder does not exist, creating it");
        }
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| StorageError::backend("create", location.as_str(), e))?;
        let store = Self { base_path };
        store.sweep_temp_uploads().await;
        Ok(store)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn object_path(&self, name: &str) -> StoreResult<PathBuf> {
        // keys are flat file names, never paths
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(StorageError::not_found(name));
        }
        Ok(self.base_path.join(name))
    }

    async fn sweep_temp_uploads(&self) {
        let Ok(mut entries) = fs::read_dir(&self.base_path).await else {
            return;
        };
        let mut removed = 0usize;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_leftover = entry.file_name().to_str().map(is_temp_upload).unwrap_or(false);
            if !is_leftover {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %entry.path().display(), error = %e, "unable to remove stale upload"),
            }
        }
        if removed > 0 {
            tracing::info!(path = %self.base_path.display(), removed, "removed stale uploads");
        }
    }

    async fn write_temp(&self, temp_path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Persists the directory entry created by a rename.
    #[cfg(unix)]
    async fn sync_dir(&self) -> std::io::Result<()> {
        fs::File::open(&self.base_path).await?.sync_all().await
    }

    #[cfg(not(unix))]
    async fn sync_dir(&self) -> std::io::Result<()> {
        Ok(())
    }

    async fn write_atomic(&self, temp: &mut TempUpload, file_path: &Path, data: &[u8]) -> std::io::Result<()> {
        self.write_temp(&temp.path, data).await?;
        fs::rename(&temp.path, file_path).await?;
        temp.committed = true;
        self.sync_dir().await
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> StoreResult<()> {
        let file_path = self.object_path(name)?;
        let mut temp = TempUpload::new(&self.base_path);

        self.write_atomic(&mut temp, &file_path, data)
            .await
            .map_err(|e| StorageError::backend("write", name, e))?;
        tracing::debug!(path = %file_path.display(), "FILE: Write");
        Ok(())
    }

    async fn get(&self, name: &str) -> StoreResult<Vec<u8>> {
        let file_path = self.object_path(name)?;
        tracing::debug!(path = %file_path.display(), "FILE: Read");
        fs::read(file_path).await.map_err(|e| StorageError::io("read", name, e))
    }

    async fn delete(&self, name: &str) -> StoreResult<()> {
        let file_path = self.object_path(name)?;
        fs::remove_file(file_path).await.map_err(|e| StorageError::io("delete", name, e))
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        let location = self.base_path.display().to_string();
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| StorageError::backend("list", location.as_str(), e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::backend("list", location.as_str(), e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            // hidden entries include in-flight uploads
            if name.starts_with('.') {
                continue;
            }
            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => names.push(name),
                _ => {}
            }
        }
        Ok(names)
    }

    fn kind(&self) -> StoreKind {
        StoreKind::File
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_get() {
        let temp_dir = tempdir().unwrap();
        let blob_store = LocalBlobStore::open(temp_dir.path()).await.unwrap();

        let name = "test_blob.png";
        let data = b"test data";

        blob_store.put(name, data).await.unwrap();

        // Verify the file was created and contains the correct data
        let file_data = std::fs::read(temp_dir.path().join(name)).unwrap();
        assert_eq!(file_data, data);
        assert_eq!(blob_store.get(name).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_put_syncs_directory_after_rename() {
        let temp_dir = tempdir().unwrap();
        let blob_store = LocalBlobStore::open(temp_dir.path()).await.unwrap();

        blob_store.put("durable.png", b"bytes").await.unwrap();
        blob_store.sync_dir().await.unwrap();
        assert!(temp_uploads(temp_dir.path()).is_empty());
        assert_eq!(std::fs::read(temp_dir.path().join("durable.png")).unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn test_put_overwrite() {
        let temp_dir = tempdir().unwrap();
        let blob_store = LocalBlobStore::open(temp_dir.path()).await.unwrap();

        let name = "test_blob.png";
        blob_store.put(name, b"test data 1").await.unwrap();
        blob_store.put(name, b"test data 2").await.unwrap();

        assert_eq!(blob_store.get(name).await.unwrap(), b"test data 2");
        assert_eq!(blob_store.list().await.unwrap(), vec![name.to_string()]);
    }

    #[tokio::test]
    async fn test_open_creates_missing_directory() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        let blob_store = LocalBlobStore::open(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(blob_store.base_path(), nested.as_path());
        assert!(blob_store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let temp_dir = tempdir().unwrap();
        let blob_store = LocalBlobStore::open(temp_dir.path()).await.unwrap();

        assert!(matches!(blob_store.get("nope.png").await, Err(StorageError::NotFound { .. })));
        assert!(matches!(blob_store.delete("nope.png").await, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_removes_object() {
        let temp_dir = tempdir().unwrap();
        let blob_store = LocalBlobStore::open(temp_dir.path()).await.unwrap();

        blob_store.put("gone.gif", b"bytes").await.unwrap();
        blob_store.delete("gone.gif").await.unwrap();

        assert!(!temp_dir.path().join("gone.gif").exists());
        assert!(blob_store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_hidden_entries_and_directories() {
        let temp_dir = tempdir().unwrap();
        let blob_store = LocalBlobStore::open(temp_dir.path()).await.unwrap();

        blob_store.put("one.png", b"1").await.unwrap();
        blob_store.put("two.jpg", b"2").await.unwrap();
        std::fs::write(temp_dir.path().join(".half-written.upload"), b"partial").unwrap();
        std::fs::create_dir(temp_dir.path().join("subdir")).unwrap();

        let mut names = blob_store.list().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["one.png".to_string(), "two.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_path_like_names_are_not_found() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().join("root");
        let blob_store = LocalBlobStore::open(&root).await.unwrap();
        std::fs::write(temp_dir.path().join("outside.png"), b"secret").unwrap();

        for name in ["../outside.png", "..", ".", "", "a\\b.png"] {
            assert!(
                matches!(blob_store.get(name).await, Err(StorageError::NotFound { .. })),
                "{name:?} should not resolve"
            );
        }
        assert!(matches!(blob_store.put("../escape.png", b"x").await, Err(StorageError::NotFound { .. })));
        assert!(!temp_dir.path().join("escape.png").exists());
    }

    #[tokio::test]
    async fn test_put_into_removed_directory_fails_without_leftovers() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().join("root");
        let blob_store = LocalBlobStore::open(&root).await.unwrap();
        std::fs::remove_dir(&root).unwrap();

        let result = blob_store.put("late.png", b"data").await;
        assert!(matches!(result, Err(StorageError::Backend { op: "write", .. })));
        assert!(!root.exists());
    }

    fn temp_uploads(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.unwrap().file_name().into_string().ok())
            .filter(|name| is_temp_upload(name))
            .collect()
    }

    #[tokio::test]
    async fn test_open_removes_stale_uploads() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join(".crashed.upload"), b"partial").unwrap();
        std::fs::write(temp_dir.path().join(".keep-me"), b"not ours").unwrap();
        std::fs::write(temp_dir.path().join("kept.png"), b"stored").unwrap();

        let blob_store = LocalBlobStore::open(temp_dir.path()).await.unwrap();

        assert!(temp_uploads(temp_dir.path()).is_empty());
        assert!(temp_dir.path().join(".keep-me").is_file());
        assert_eq!(blob_store.list().await.unwrap(), vec!["kept.png".to_string()]);
    }

    #[test]
    fn test_uncommitted_temp_upload_is_removed_on_drop() {
        let temp_dir = tempdir().unwrap();

        let temp = TempUpload::new(temp_dir.path());
        std::fs::write(&temp.path, b"partial").unwrap();
        drop(temp);
        assert!(temp_uploads(temp_dir.path()).is_empty());

        let mut temp = TempUpload::new(temp_dir.path());
        std::fs::write(&temp.path, b"renamed elsewhere").unwrap();
        temp.committed = true;
        let path = temp.path.clone();
        drop(temp);
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_cancelled_put_leaves_no_temp_file() {
        let temp_dir = tempdir().unwrap();
        let blob_store = LocalBlobStore::open(temp_dir.path()).await.unwrap();
        let data = vec![0u8; 8 * 1024 * 1024];

        let writer = blob_store.clone();
        let handle = tokio::spawn(async move { writer.put("big.png", &data).await });
        for _ in 0..1000 {
            if handle.is_finished() || !temp_uploads(temp_dir.path()).is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        handle.abort();
        let _ = handle.await;

        assert!(temp_uploads(temp_dir.path()).is_empty());
    }
}
