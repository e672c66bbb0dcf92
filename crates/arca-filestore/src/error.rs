use arca_types::{ErrorClass, FileStoreId};

/// Errors from file store registry operations.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    /// No store with this id is registered.
    #[error("file store not found: {0}")]
    NotFound(FileStoreId),

    /// No store with this name is registered.
    #[error("file store not found by name: {0}")]
    NameNotFound(String),

    /// Another store already uses this name.
    #[error("file store name already in use: {0}")]
    DuplicateName(String),

    /// The store exists but does not accept writes.
    #[error("file store {name} ({id}) is inactive")]
    Inactive { id: FileStoreId, name: String },

    /// Content rows still point into the store.
    #[error("file store {id} is still referenced by {references} content row(s)")]
    InUse { id: FileStoreId, references: u64 },

    /// The store name is empty or otherwise unusable.
    #[error("invalid file store name: {0:?}")]
    InvalidName(String),

    /// The root directory cannot be created, is not a directory, or is not
    /// writable.
    #[error("invalid root for file store {name}: {reason}")]
    InvalidRoot { name: String, reason: String },

    /// Querying filesystem capacity failed.
    #[error("cannot query capacity of file store {id}: {source}")]
    Capacity {
        id: FileStoreId,
        #[source]
        source: std::io::Error,
    },

    /// The persistence backend failed.
    #[error("file store backend error: {0}")]
    Backend(String),
}

impl FileStoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) | Self::NameNotFound(_) => ErrorClass::NotFound,
            Self::DuplicateName(_) | Self::Inactive { .. } | Self::InUse { .. } => {
                ErrorClass::InvalidState
            }
            Self::InvalidName(_) | Self::InvalidRoot { .. } => ErrorClass::Validation,
            Self::Capacity { .. } | Self::Backend(_) => ErrorClass::StorageIo,
        }
    }
}

/// Result alias for file store operations.
pub type FileStoreResult<T> = Result<T, FileStoreError>;
