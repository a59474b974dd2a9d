use async_trait::async_trait;
use std::error::Error as StdError;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use crate::config::ObjectStoreSettings;
use crate::error::{StorageError, StoreResult};
use crate::store::{BlobStore, StoreKind};

pub const DEFAULT_REGION: &str = "us-east-1";

/// Creates an S3 client from static credentials, pointed at a custom endpoint
/// when one is configured.
pub async fn create_s3_client(settings: &ObjectStoreSettings) -> S3Client {
    // AWS_DEFAULT_REGION may be empty on S3-compatible stores such as NooBaa,
    // so the environment is not consulted again here.
    let region = Region::new(settings.region.clone().unwrap_or_else(|| DEFAULT_REGION.to_string()));
    let credentials = Credentials::new(
        settings.access_key_id.clone(),
        settings.secret_access_key.clone(),
        None,
        None,
        "image-store",
    );
    let base_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .credentials_provider(credentials)
        .load()
        .await;

    let mut builder = Builder::from(&base_config);
    if let Some(endpoint) = &settings.endpoint_url {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    S3Client::from_conf(builder.build())
}

/// Stores objects in one bucket of an S3-compatible service.
#[derive(Clone, Debug)]
pub struct S3BlobStore {
    s3_client: S3Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(s3_client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            s3_client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Renders the full cause chain; an SDK error alone displays as "dispatch failure".
fn sdk_failure<E>(op: &'static str, name: &str, err: E) -> StorageError
where
    E: StdError,
{
    StorageError::backend(op, name, DisplayErrorContext(err).to_string())
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> StoreResult<()> {
        tracing::debug!(bucket = %self.bucket, key = name, "S3: Put object");
        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| sdk_failure("put", name, e))?;
        Ok(())
    }

    async fn get(&self, name: &str) -> StoreResult<Vec<u8>> {
        tracing::debug!(bucket = %self.bucket, key = name, "S3: Read");
        let resp = self
            .s3_client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| {
                let missing = e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false);
                if missing {
                    StorageError::not_found(name)
                } else {
                    sdk_failure("get", name, e)
                }
            })?;
        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| sdk_failure("get", name, e))?;
        Ok(data.into_bytes().to_vec())
    }

    /// S3 acknowledges deletes of absent keys, so this never reports NotFound.
    async fn delete(&self, name: &str) -> StoreResult<()> {
        tracing::debug!(bucket = %self.bucket, key = name, "S3: Delete");
        self.s3_client
            .delete_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| sdk_failure("delete", name, e))?;
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        tracing::debug!(bucket = %self.bucket, "S3: Listing bucket");
        let mut names = Vec::new();
        let mut continuation_token: Option<String> = None;
        loop {
            let resp = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| sdk_failure("list", &self.bucket, e))?;

            names.extend(resp.contents().iter().filter_map(|object| object.key()).map(str::to_string));

            match resp.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }
        Ok(names)
    }

    fn kind(&self) -> StoreKind {
        StoreKind::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use uuid::Uuid;
    // Needs S3_TEST_BUCKET plus AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY, and
    // optionally S3_TEST_ENDPOINT for a MinIO or NooBaa endpoint.

    async fn test_store() -> S3BlobStore {
        let settings = ObjectStoreSettings {
            access_key_id: env::var("AWS_ACCESS_KEY_ID").expect("AWS_ACCESS_KEY_ID must be set"),
            secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").expect("AWS_SECRET_ACCESS_KEY must be set"),
            bucket: env::var("S3_TEST_BUCKET").expect("S3_TEST_BUCKET must be set"),
            region: env::var("AWS_DEFAULT_REGION").ok(),
            endpoint_url: env::var("S3_TEST_ENDPOINT").ok(),
        };
        let client = create_s3_client(&settings).await;
        S3BlobStore::new(client, settings.bucket)
    }

    fn offline_settings(region: Option<&str>) -> ObjectStoreSettings {
        ObjectStoreSettings {
            access_key_id: "test-access-key".to_string(),
            secret_access_key: "test-secret-key".to_string(),
            bucket: "images".to_string(),
            region: region.map(str::to_string),
            // nothing listens on port 1
            endpoint_url: Some("http://127.0.0.1:1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_missing_region_falls_back_to_default() {
        env::set_var("AWS_DEFAULT_REGION", "");
        let client = create_s3_client(&offline_settings(None)).await;
        assert_eq!(client.config().region(), Some(&Region::new(DEFAULT_REGION)));

        let client = create_s3_client(&offline_settings(Some("eu-west-1"))).await;
        assert_eq!(client.config().region(), Some(&Region::new("eu-west-1")));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_cause() {
        let settings = offline_settings(Some(DEFAULT_REGION));
        let blob_store = S3BlobStore::new(create_s3_client(&settings).await, settings.bucket);

        let err = blob_store.list().await.unwrap_err();
        assert!(matches!(err, StorageError::Backend { op: "list", .. }));
        let message = err.to_string();
        assert!(message.contains("Connection refused"), "cause missing from: {message}");

        let err = blob_store.get("5d41402abc4b2a76b9719d911017c592.png").await.unwrap_err();
        assert!(err.to_string().contains("Connection refused"));
    }

    #[tokio::test]
    #[ignore = "requires an S3-compatible bucket"]
    async fn test_put_get_list_delete() {
        let blob_store = test_store().await;
        let name = format!("{}.png", Uuid::new_v4().simple());
        let data = b"this is test data";

        blob_store.put(&name, data).await.expect("upload failed");
        let retrieved = blob_store.get(&name).await.expect("download failed");
        assert_eq!(retrieved, data);
        assert!(blob_store.list().await.expect("list failed").contains(&name));

        blob_store.delete(&name).await.expect("delete failed");
        assert!(matches!(blob_store.get(&name).await, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    #[ignore = "requires an S3-compatible bucket"]
    async fn test_put_overwrite() {
        let blob_store = test_store().await;
        let name = format!("{}.gif", Uuid::new_v4().simple());

        blob_store.put(&name, b"data one").await.expect("first upload failed");
        blob_store.put(&name, b"data two").await.expect("second upload failed");

        let retrieved = blob_store.get(&name).await.expect("download failed");
        blob_store.delete(&name).await.expect("deleted");
        assert_eq!(retrieved, b"data two");
    }
}
