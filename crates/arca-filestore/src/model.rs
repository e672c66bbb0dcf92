use std::path::{Path, PathBuf};

use arca_shard::ShardPath;
use arca_types::{FileStoreId, FileStoreStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered external storage root.
///
/// Content rows point at a store by id and keep a [`ShardPath`] relative to
/// [`FileStore::root_path`]; moving a store's directory only requires
/// updating this row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStore {
    pub id: FileStoreId,
    /// Globally unique, human-readable name.
    pub name: String,
    pub root_path: PathBuf,
    pub status: FileStoreStatus,
    pub created_at: DateTime<Utc>,
}

impl FileStore {
    /// A new, active store rooted at `root_path`. Nothing touches the
    /// filesystem until the store is saved through the registry.
    pub fn new(name: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            id: FileStoreId::new(),
            name: name.into(),
            root_path: root_path.into(),
            status: FileStoreStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// Same as [`FileStore::new`] but registered in the inactive state.
    pub fn new_inactive(name: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            status: FileStoreStatus::Inactive,
            ..Self::new(name, root_path)
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Absolute location of a shard path inside this store.
    pub fn resolve(&self, shard_path: &ShardPath) -> PathBuf {
        shard_path.under(&self.root_path)
    }
}
