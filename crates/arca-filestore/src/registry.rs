use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use arca_shard::ShardPath;
use arca_types::{FileStoreId, FileStoreStatus};
use tracing::{debug, info, warn};

use crate::error::{FileStoreError, FileStoreResult};
use crate::model::FileStore;
use crate::space;
use crate::traits::{ContentReferences, FileStoreRepository};

/// Public operations on registered file stores.
///
/// All validation happens before the repository is touched: a store that
/// fails `save` or `activate` leaves no trace in the metadata.
///
/// Writers run through [`with_active`](Self::with_active) and share the
/// `writers` lock; [`delete`](Self::delete) holds it exclusively, so a store
/// cannot be removed between a writer's active check and the commit of the
/// row that references it.
pub struct FileStoreRegistry {
    repo: Arc<dyn FileStoreRepository>,
    references: Arc<dyn ContentReferences>,
    writers: RwLock<()>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> FileStoreError {
    FileStoreError::Backend(format!("writer lock poisoned: {e}"))
}

impl FileStoreRegistry {
    pub fn new(repo: Arc<dyn FileStoreRepository>, references: Arc<dyn ContentReferences>) -> Self {
        Self {
            repo,
            references,
            writers: RwLock::new(()),
        }
    }

    /// Validate and persist a store (insert or update).
    ///
    /// Rejects empty names, names used by another store, and roots that
    /// cannot be created or written to. The root directory is created if it
    /// is missing.
    pub fn save(&self, store: FileStore) -> FileStoreResult<FileStore> {
        if store.name.trim().is_empty() {
            return Err(FileStoreError::InvalidName(store.name));
        }
        if let Some(existing) = self.repo.find_by_name(&store.name)? {
            if existing.id != store.id {
                return Err(FileStoreError::DuplicateName(store.name));
            }
        }
        validate_root(&store.name, &store.root_path)?;

        self.repo.save(&store)?;
        info!(store = %store.id, name = %store.name, status = %store.status, "saved file store");
        Ok(store)
    }

    pub fn find_by_id(&self, id: &FileStoreId) -> FileStoreResult<FileStore> {
        self.repo
            .find_by_id(id)?
            .ok_or(FileStoreError::NotFound(*id))
    }

    pub fn find_by_name(&self, name: &str) -> FileStoreResult<FileStore> {
        self.repo
            .find_by_name(name)?
            .ok_or_else(|| FileStoreError::NameNotFound(name.to_string()))
    }

    pub fn find_all(&self) -> FileStoreResult<Vec<FileStore>> {
        self.repo.find_all()
    }

    /// Re-validate the root and mark the store active.
    pub fn activate(&self, id: &FileStoreId) -> FileStoreResult<FileStore> {
        let mut store = self.find_by_id(id)?;
        validate_root(&store.name, &store.root_path)?;
        store.status = FileStoreStatus::Active;
        self.repo.save(&store)?;
        info!(store = %store.id, name = %store.name, "activated file store");
        Ok(store)
    }

    /// Mark the store inactive. Always allowed; existing files stay readable.
    pub fn deactivate(&self, id: &FileStoreId) -> FileStoreResult<FileStore> {
        let mut store = self.find_by_id(id)?;
        store.status = FileStoreStatus::Inactive;
        self.repo.save(&store)?;
        info!(store = %store.id, name = %store.name, "deactivated file store");
        Ok(store)
    }

    /// Remove the store row. Fails while any content still references it.
    ///
    /// The root directory and anything left in it are not removed.
    pub fn delete(&self, id: &FileStoreId) -> FileStoreResult<()> {
        let _writers = self.writers.write().map_err(poisoned)?;
        let store = self.find_by_id(id)?;
        let references = self.references.count_referencing(id)?;
        if references > 0 {
            warn!(store = %id, references, "refusing to delete referenced file store");
            return Err(FileStoreError::InUse {
                id: *id,
                references,
            });
        }
        self.repo.delete(id)?;
        info!(store = %id, name = %store.name, "deleted file store");
        Ok(())
    }

    /// Bytes currently available on the filesystem holding the store root.
    pub fn get_available_space(&self, id: &FileStoreId) -> FileStoreResult<u64> {
        let store = self.find_by_id(id)?;
        let available = space::available_space(&store.root_path)
            .map_err(|source| FileStoreError::Capacity { id: *id, source })?;
        debug!(store = %id, available, "queried file store capacity");
        Ok(available)
    }

    /// Advisory check that `bytes` would currently fit. Not a reservation.
    pub fn has_enough_space(&self, id: &FileStoreId, bytes: u64) -> FileStoreResult<bool> {
        Ok(self.get_available_space(id)? >= bytes)
    }

    /// Load a store and fail unless it accepts writes.
    pub fn require_active(&self, id: &FileStoreId) -> FileStoreResult<FileStore> {
        let store = self.find_by_id(id)?;
        if !store.is_active() {
            return Err(FileStoreError::Inactive {
                id: store.id,
                name: store.name,
            });
        }
        Ok(store)
    }

    /// Run `write` against the active store `id`, holding off deletion of
    /// the store until `write` returns.
    ///
    /// `write` should both put the bytes in place and commit the row that
    /// references them.
    pub fn with_active<T, E>(
        &self,
        id: &FileStoreId,
        write: impl FnOnce(&FileStore) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<FileStoreError>,
    {
        let _writers = self.writers.read().map_err(poisoned)?;
        let store = self.require_active(id)?;
        write(&store)
    }

    /// Absolute path of `shard_path` inside the store `id`.
    pub fn resolve_path(&self, id: &FileStoreId, shard_path: &ShardPath) -> FileStoreResult<PathBuf> {
        Ok(self.find_by_id(id)?.resolve(shard_path))
    }
}

/// Ensure `root` exists, is a directory, and accepts new files.
fn validate_root(name: &str, root: &Path) -> FileStoreResult<()> {
    let invalid = |reason: String| FileStoreError::InvalidRoot {
        name: name.to_string(),
        reason,
    };

    if root.as_os_str().is_empty() {
        return Err(invalid("root path is empty".into()));
    }
    fs::create_dir_all(root).map_err(|e| invalid(format!("cannot create root: {e}")))?;
    let meta = fs::metadata(root).map_err(|e| invalid(format!("cannot stat root: {e}")))?;
    if !meta.is_dir() {
        return Err(invalid("root is not a directory".into()));
    }
    tempfile::Builder::new()
        .prefix(".arca-probe-")
        .tempfile_in(root)
        .map_err(|e| invalid(format!("root is not writable: {e}")))?;
    Ok(())
}
