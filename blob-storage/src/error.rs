use std::error::Error as StdError;
use std::io;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

pub type StoreResult<T> = Result<T, StorageError>;

pub type BlobResult<T> = Result<T, BlobError>;

/// Failures reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {name}")]
    NotFound { name: String },

    #[error("storage backend failed to {op} {name}: {source}")]
    Backend {
        op: &'static str,
        name: String,
        #[source]
        source: BoxError,
    },
}

impl StorageError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn backend<E>(op: &'static str, name: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Backend {
            op,
            name: name.into(),
            source: source.into(),
        }
    }

    /// Maps an I/O error, folding `ErrorKind::NotFound` into [`StorageError::NotFound`].
    pub fn io(op: &'static str, name: impl Into<String>, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::not_found(name)
        } else {
            Self::backend(op, name, source)
        }
    }
}

/// Failures surfaced by the [`BlobService`](crate::service::BlobService).
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("file type not allowed: {filename}")]
    Rejected { filename: String },

    #[error("blob not found: {name}")]
    NotFound { name: String },

    #[error(transparent)]
    Storage(StorageError),
}

impl BlobError {
    pub fn rejected(filename: impl Into<String>) -> Self {
        Self::Rejected { filename: filename.into() }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}

impl From<StorageError> for BlobError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { name } => BlobError::NotFound { name },
            other => BlobError::Storage(other),
        }
    }
}
