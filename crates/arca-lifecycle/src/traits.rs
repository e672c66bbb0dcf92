use arca_types::ObjectId;

use crate::error::LifecycleResult;
use crate::header::Versioned;

/// Persistence adapter for one object kind.
///
/// Implementations must be thread-safe and make each call atomic. `save`
/// must reject a second object holding the same (name, major, minor) with
/// [`LifecycleError::DuplicateVersion`](crate::LifecycleError::DuplicateVersion).
pub trait ObjectRepository<K: Versioned>: Send + Sync {
    fn find_by_id(&self, id: &ObjectId) -> LifecycleResult<Option<K>>;

    /// Every version of `name`, highest version first.
    fn find_by_name(&self, name: &str) -> LifecycleResult<Vec<K>>;

    /// Every version no other version names as its parent, ordered by name
    /// then version descending.
    fn find_latest_per_name(&self) -> LifecycleResult<Vec<K>>;

    /// Every stored object, ordered by name then version.
    fn find_all(&self) -> LifecycleResult<Vec<K>>;

    /// Versions whose parent is `parent`, ordered by version.
    fn find_children(&self, parent: &ObjectId) -> LifecycleResult<Vec<K>>;

    /// Insert or replace an object.
    fn save(&self, object: &K) -> LifecycleResult<()>;

    /// Remove an object. Returns `true` if it existed.
    fn delete(&self, id: &ObjectId) -> LifecycleResult<bool>;

    fn exists(&self, id: &ObjectId) -> LifecycleResult<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }
}
