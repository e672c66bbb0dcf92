use arca_filestore::FileStoreError;
use arca_shard::ShardError;
use arca_types::{ContentId, ErrorClass};

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The content row does not exist.
    #[error("content not found: {0}")]
    NotFound(ContentId),

    /// Renditions may only be attached to primary content.
    #[error("content {target} is a secondary rendition and cannot have renditions")]
    NestedRendition { target: ContentId },

    /// The operation needs a primary content but got a secondary.
    #[error("content {0} is not a primary content")]
    NotPrimary(ContentId),

    /// `move_to_database` on content that is already inline.
    #[error("content {0} is already stored inline")]
    AlreadyInline(ContentId),

    /// `move_to_file_store` on content that is already external.
    #[error("content {0} is already stored in a file store")]
    AlreadyExternal(ContentId),

    /// Content names must be non-empty.
    #[error("invalid content name: {0:?}")]
    InvalidName(String),

    /// Reading or writing the bytes of external content failed.
    ///
    /// `path` is the store-relative shard path.
    #[error("storage I/O failed for content {content} at {path}: {source}")]
    StorageIo {
        content: ContentId,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    FileStore(#[from] FileStoreError),

    #[error(transparent)]
    Shard(#[from] ShardError),

    /// The persistence backend failed.
    #[error("content backend error: {0}")]
    Backend(String),
}

impl ContentError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::NestedRendition { .. }
            | Self::NotPrimary(_)
            | Self::AlreadyInline(_)
            | Self::AlreadyExternal(_) => ErrorClass::InvalidState,
            Self::InvalidName(_) => ErrorClass::Validation,
            Self::StorageIo { .. } | Self::Backend(_) => ErrorClass::StorageIo,
            Self::FileStore(e) => e.class(),
            Self::Shard(e) => e.class(),
        }
    }
}

/// Result alias for content operations.
pub type ContentResult<T> = Result<T, ContentError>;
