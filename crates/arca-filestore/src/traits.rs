//! Persistence seams for the file store registry.

use arca_types::FileStoreId;

use crate::error::FileStoreResult;
use crate::model::FileStore;

/// Storage backend for [`FileStore`] rows.
///
/// Implementations must be thread-safe and make each call atomic. Name
/// uniqueness is enforced by the registry before `save` is called, but a
/// backend with a unique index may reject duplicates as well.
pub trait FileStoreRepository: Send + Sync {
    /// Look up a store by id. Returns `Ok(None)` if it does not exist.
    fn find_by_id(&self, id: &FileStoreId) -> FileStoreResult<Option<FileStore>>;

    /// Look up a store by its unique name.
    fn find_by_name(&self, name: &str) -> FileStoreResult<Option<FileStore>>;

    /// All registered stores, ordered by name.
    fn find_all(&self) -> FileStoreResult<Vec<FileStore>>;

    /// Insert or replace the row keyed by `store.id`.
    fn save(&self, store: &FileStore) -> FileStoreResult<()>;

    /// Remove a row. Returns `true` if it existed.
    fn delete(&self, id: &FileStoreId) -> FileStoreResult<bool>;

    fn exists(&self, id: &FileStoreId) -> FileStoreResult<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }
}

/// Count query answered by whatever owns content rows.
///
/// The registry never sees content itself; it only needs to know whether a
/// store is still referenced before allowing deletion.
pub trait ContentReferences: Send + Sync {
    /// Number of content rows whose external pointer targets `store`.
    fn count_referencing(&self, store: &FileStoreId) -> FileStoreResult<u64>;
}
