use arca_types::{ErrorClass, ObjectId, Version};

/// Errors from versioned object operations.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: ObjectId },

    /// Another object already holds this version of the name.
    #[error("version {version} of {name:?} already exists")]
    DuplicateVersion { name: String, version: Version },

    /// The parent chain loops back on itself or runs upward in version.
    #[error("corrupt lineage at {id}: {reason}")]
    CorruptLineage { id: ObjectId, reason: String },

    /// The next version number does not fit in a `u32`.
    #[error("no version left after {current} of {name:?}")]
    VersionExhausted { name: String, current: Version },

    #[error("invalid object name: {0:?}")]
    InvalidName(String),

    /// No capability set is registered for this kind id.
    #[error("unknown object kind: {0}")]
    UnknownKind(String),

    /// The persistence backend failed.
    #[error("lifecycle backend error: {0}")]
    Backend(String),
}

impl LifecycleError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } | Self::UnknownKind(_) => ErrorClass::NotFound,
            Self::DuplicateVersion { .. }
            | Self::CorruptLineage { .. }
            | Self::VersionExhausted { .. } => ErrorClass::InvalidState,
            Self::InvalidName(_) => ErrorClass::Validation,
            Self::Backend(_) => ErrorClass::StorageIo,
        }
    }
}

/// Result alias for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
