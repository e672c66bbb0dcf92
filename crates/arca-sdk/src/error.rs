use std::path::PathBuf;

use arca_types::{ErrorClass, ObjectId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("cannot load config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("catalog I/O failed at {path}: {source}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog at {path} is malformed: {reason}")]
    CatalogFormat { path: PathBuf, reason: String },

    #[error("{kind} {id} cannot own content")]
    ContentNotAccepted { kind: &'static str, id: ObjectId },

    #[error("file store {store} lacks space for {needed} bytes ({available} available)")]
    InsufficientSpace {
        store: String,
        needed: u64,
        available: u64,
    },

    #[error(transparent)]
    FileStore(#[from] arca_filestore::FileStoreError),

    #[error(transparent)]
    Content(#[from] arca_content::ContentError),

    #[error(transparent)]
    Lifecycle(#[from] arca_lifecycle::LifecycleError),
}

impl SdkError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Config { .. } => ErrorClass::Validation,
            Self::CatalogIo { .. } | Self::CatalogFormat { .. } | Self::InsufficientSpace { .. } => {
                ErrorClass::StorageIo
            }
            Self::ContentNotAccepted { .. } => ErrorClass::InvalidState,
            Self::FileStore(e) => e.class(),
            Self::Content(e) => e.class(),
            Self::Lifecycle(e) => e.class(),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
