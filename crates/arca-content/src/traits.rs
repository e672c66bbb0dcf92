use arca_types::{ContentId, FileStoreId, ObjectId};

use crate::error::ContentResult;
use crate::model::Content;

/// Storage backend for [`Content`] rows.
///
/// Implementations must be thread-safe and make each call atomic. Rows are
/// returned in creation order (`seq`) wherever a list is returned.
pub trait ContentRepository: Send + Sync {
    fn find_by_id(&self, id: &ContentId) -> ContentResult<Option<Content>>;

    /// Insert a new row, assigning its creation sequence. Returns the stored
    /// row.
    fn insert(&self, content: Content) -> ContentResult<Content>;

    /// Replace an existing row. Fails with `NotFound` if it is absent.
    fn update(&self, content: &Content) -> ContentResult<()>;

    /// Remove rows atomically. Returns how many existed.
    fn delete_many(&self, ids: &[ContentId]) -> ContentResult<usize>;

    /// Secondary renditions of `primary`, oldest first.
    fn find_secondaries(&self, primary: &ContentId) -> ContentResult<Vec<Content>>;

    /// Every row owned by `owner`, oldest first.
    fn find_by_owner(&self, owner: &ObjectId) -> ContentResult<Vec<Content>>;

    /// Number of rows whose external pointer targets `store`.
    fn count_by_file_store(&self, store: &FileStoreId) -> ContentResult<u64>;

    fn delete(&self, id: &ContentId) -> ContentResult<bool> {
        Ok(self.delete_many(std::slice::from_ref(id))? > 0)
    }
}
