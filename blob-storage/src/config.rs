use std::fmt::{self, Debug, Formatter};
use std::path::{Path, PathBuf};

/// Connection details for an S3-compatible bucket.
#[derive(Clone)]
pub struct ObjectStoreSettings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub region: Option<String>,
    /// Custom endpoint, e.g. `https://s3.openshift-storage.svc`. `None` targets AWS.
    pub endpoint_url: Option<String>,
}

impl Debug for ObjectStoreSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreSettings")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Raw, possibly incomplete settings as read from the environment.
#[derive(Debug, Clone, Default)]
pub struct StorageSettings {
    pub upload_folder: PathBuf,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: Option<String>,
    pub bucket_name: Option<String>,
    pub bucket_host: Option<String>,
    pub bucket_port: Option<String>,
}

/// The storage backend chosen for the lifetime of the process.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Filesystem { root: PathBuf },
    ObjectStore(ObjectStoreSettings),
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// `http` on port 80, `https` otherwise. The port itself is not part of the endpoint.
pub fn endpoint_url(host: &str, port: &str) -> String {
    let scheme = if port == "80" { "http" } else { "https" };
    format!("{scheme}://{host}")
}

impl StorageConfig {
    /// Object store iff access key, secret key and bucket name are all set.
    pub fn select(settings: &StorageSettings) -> Self {
        let credentials = (
            present(&settings.access_key_id),
            present(&settings.secret_access_key),
            present(&settings.bucket_name),
        );
        match credentials {
            (Some(access_key_id), Some(secret_access_key), Some(bucket)) => {
                let endpoint_url = match (present(&settings.bucket_host), present(&settings.bucket_port)) {
                    (Some(host), Some(port)) => Some(endpoint_url(&host, &port)),
                    _ => None,
                };
                StorageConfig::ObjectStore(ObjectStoreSettings {
                    access_key_id,
                    secret_access_key,
                    bucket,
                    region: present(&settings.region),
                    endpoint_url,
                })
            }
            _ => StorageConfig::Filesystem {
                root: settings.upload_folder.clone(),
            },
        }
    }

    /// `s3`, or for a directory `pvc` when it is a mounted volume and `ephemeral` otherwise.
    pub fn deployment_type(&self) -> &'static str {
        match self {
            StorageConfig::ObjectStore(_) => "s3",
            StorageConfig::Filesystem { root } if is_mount_point(root) => "pvc",
            StorageConfig::Filesystem { .. } => "ephemeral",
        }
    }

    /// Where blobs live, for display.
    pub fn location(&self) -> String {
        match self {
            StorageConfig::Filesystem { root } => root.display().to_string(),
            StorageConfig::ObjectStore(settings) => match &settings.endpoint_url {
                Some(endpoint) => format!("{}/{}", endpoint, settings.bucket),
                None => settings.bucket.clone(),
            },
        }
    }
}

#[cfg(unix)]
fn is_mount_point(path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    let Ok(path) = path.canonicalize() else {
        return false;
    };
    let Some(parent) = path.parent() else {
        // filesystem root
        return true;
    };
    match (std::fs::metadata(&path), std::fs::metadata(parent)) {
        (Ok(this), Ok(above)) => this.dev() != above.dev() || this.ino() == above.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_mount_point(_path: &Path) -> bool {
    false
}
