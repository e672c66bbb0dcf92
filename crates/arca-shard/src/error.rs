use arca_types::ErrorClass;

/// Errors from shard path handling.
#[derive(Debug, thiserror::Error)]
pub enum ShardError {
    /// A persisted path does not follow the `aa/bb/cc/dd/<id>[.ext]` layout.
    #[error("malformed shard path {path:?}: {reason}")]
    Malformed { path: String, reason: String },

    /// A filesystem operation on a shard path failed.
    ///
    /// `path` is relative to the store root; absolute roots are never put
    /// into error messages.
    #[error("I/O error on shard path {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ShardError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Malformed { .. } => ErrorClass::Validation,
            Self::Io { .. } => ErrorClass::StorageIo,
        }
    }
}

/// Result alias for shard operations.
pub type ShardResult<T> = Result<T, ShardError>;
