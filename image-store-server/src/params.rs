use std::path::PathBuf;

use blob_storage::StorageSettings;
use clap::Parser;

/// Every option can also be given through the environment variable of the same name.
#[derive(Parser, Debug)]
#[command(name = "image-store-server", about = "List, upload, view and delete images")]
pub struct Args {
    #[clap(long, env = "HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub(crate) http_addr: String,
    /// Directory used when no object store is configured
    #[clap(long, env = "UPLOAD_FOLDER", default_value = "/tmp/storage")]
    pub(crate) upload_folder: PathBuf,
    #[clap(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub(crate) aws_access_key_id: Option<String>,
    #[clap(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub(crate) aws_secret_access_key: Option<String>,
    #[clap(long, env = "AWS_DEFAULT_REGION")]
    pub(crate) aws_default_region: Option<String>,
    #[clap(long, env = "BUCKET_NAME")]
    pub(crate) bucket_name: Option<String>,
    /// Host of an S3-compatible endpoint (e.g. NooBaa); needs --bucket-port too
    #[clap(long, env = "BUCKET_HOST")]
    pub(crate) bucket_host: Option<String>,
    /// Port 80 selects http, anything else https
    #[clap(long, env = "BUCKET_PORT")]
    pub(crate) bucket_port: Option<String>,
}

impl Args {
    pub(crate) fn storage_settings(&self) -> StorageSettings {
        StorageSettings {
            upload_folder: self.upload_folder.clone(),
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
            region: self.aws_default_region.clone(),
            bucket_name: self.bucket_name.clone(),
            bucket_host: self.bucket_host.clone(),
            bucket_port: self.bucket_port.clone(),
        }
    }
}
