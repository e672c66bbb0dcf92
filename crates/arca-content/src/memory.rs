//! In-memory content repository.
//!
//! Rows live in a `HashMap` behind a single `RwLock`, so every trait call is
//! atomic with respect to every other. The repository also answers the file
//! store registry's reference-count query.

use std::collections::HashMap;
use std::sync::RwLock;

use arca_filestore::{ContentReferences, FileStoreError, FileStoreResult};
use arca_types::{ContentId, FileStoreId, ObjectId};

use crate::error::{ContentError, ContentResult};
use crate::model::Content;
use crate::traits::ContentRepository;

#[derive(Debug, Default)]
struct Rows {
    by_id: HashMap<ContentId, Content>,
    next_seq: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    inner: RwLock<Rows>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a repository from snapshotted rows, keeping their sequence
    /// numbers.
    pub fn from_rows(rows: impl IntoIterator<Item = Content>) -> Self {
        let by_id: HashMap<ContentId, Content> = rows.into_iter().map(|c| (c.id, c)).collect();
        let next_seq = by_id.values().map(|c| c.seq + 1).max().unwrap_or(0);
        Self {
            inner: RwLock::new(Rows { by_id, next_seq }),
        }
    }

    /// Every row, in creation order.
    pub fn snapshot(&self) -> ContentResult<Vec<Content>> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(sorted(rows.by_id.values().cloned()))
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|r| r.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> ContentError {
    ContentError::Backend(format!("lock poisoned: {e}"))
}

fn sorted(rows: impl Iterator<Item = Content>) -> Vec<Content> {
    let mut rows: Vec<Content> = rows.collect();
    rows.sort_by_key(|c| c.seq);
    rows
}

impl ContentRepository for InMemoryContentRepository {
    fn find_by_id(&self, id: &ContentId) -> ContentResult<Option<Content>> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows.by_id.get(id).cloned())
    }

    fn insert(&self, mut content: Content) -> ContentResult<Content> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        content.seq = rows.next_seq;
        rows.next_seq += 1;
        rows.by_id.insert(content.id, content.clone());
        Ok(content)
    }

    fn update(&self, content: &Content) -> ContentResult<()> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        match rows.by_id.get_mut(&content.id) {
            Some(existing) => {
                *existing = content.clone();
                Ok(())
            }
            None => Err(ContentError::NotFound(content.id)),
        }
    }

    fn delete_many(&self, ids: &[ContentId]) -> ContentResult<usize> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        Ok(ids.iter().filter(|id| rows.by_id.remove(id).is_some()).count())
    }

    fn find_secondaries(&self, primary: &ContentId) -> ContentResult<Vec<Content>> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(sorted(
            rows.by_id
                .values()
                .filter(|c| c.rendition_parent.as_ref() == Some(primary))
                .cloned(),
        ))
    }

    fn find_by_owner(&self, owner: &ObjectId) -> ContentResult<Vec<Content>> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(sorted(
            rows.by_id.values().filter(|c| &c.owner == owner).cloned(),
        ))
    }

    fn count_by_file_store(&self, store: &FileStoreId) -> ContentResult<u64> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows
            .by_id
            .values()
            .filter(|c| c.payload.external().map(|(s, _)| s) == Some(store))
            .count() as u64)
    }
}

impl ContentReferences for InMemoryContentRepository {
    fn count_referencing(&self, store: &FileStoreId) -> FileStoreResult<u64> {
        self.count_by_file_store(store)
            .map_err(|e| FileStoreError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Payload;

    fn inline(owner: ObjectId, name: &str) -> Content {
        Content::primary(
            name.into(),
            "text/plain".into(),
            owner,
            Payload::Inline {
                data: name.as_bytes().to_vec(),
            },
            name.len() as u64,
        )
    }

    #[test]
    fn insert_assigns_increasing_seq() {
        let repo = InMemoryContentRepository::new();
        let owner = ObjectId::new();
        let a = repo.insert(inline(owner, "a")).unwrap();
        let b = repo.insert(inline(owner, "b")).unwrap();
        assert!(a.seq < b.seq);
        let names: Vec<String> = repo
            .find_by_owner(&owner)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn update_missing_row_fails() {
        let repo = InMemoryContentRepository::new();
        let err = repo.update(&inline(ObjectId::new(), "x")).unwrap_err();
        assert!(matches!(err, ContentError::NotFound(_)));
    }

    #[test]
    fn secondaries_in_creation_order() {
        let repo = InMemoryContentRepository::new();
        let owner = ObjectId::new();
        let primary = repo.insert(inline(owner, "p")).unwrap();
        for name in ["r1", "r2", "r3"] {
            let mut r = inline(owner, name);
            r.is_primary = false;
            r.rendition_parent = Some(primary.id);
            repo.insert(r).unwrap();
        }
        let names: Vec<String> = repo
            .find_secondaries(&primary.id)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn counts_external_references() {
        let repo = InMemoryContentRepository::new();
        let store = FileStoreId::new();
        let mut c = inline(ObjectId::new(), "x");
        c.payload = Payload::External {
            file_store: store,
            shard_path: "00/11/22/33/00112233445566778899aabbccddeeff".parse().unwrap(),
        };
        repo.insert(c).unwrap();
        repo.insert(inline(ObjectId::new(), "y")).unwrap();
        assert_eq!(repo.count_referencing(&store).unwrap(), 1);
        assert_eq!(repo.count_referencing(&FileStoreId::new()).unwrap(), 0);
    }

    #[test]
    fn snapshot_restore_keeps_sequence() {
        let repo = InMemoryContentRepository::new();
        let owner = ObjectId::new();
        repo.insert(inline(owner, "a")).unwrap();
        repo.insert(inline(owner, "b")).unwrap();

        let restored = InMemoryContentRepository::from_rows(repo.snapshot().unwrap());
        let c = restored.insert(inline(owner, "c")).unwrap();
        assert_eq!(c.seq, 2);
        assert_eq!(restored.len(), 3);
    }

    #[test]
    fn delete_many_counts_existing() {
        let repo = InMemoryContentRepository::new();
        let a = repo.insert(inline(ObjectId::new(), "a")).unwrap();
        assert_eq!(repo.delete_many(&[a.id, ContentId::new()]).unwrap(), 1);
        assert!(!repo.delete(&a.id).unwrap());
        assert!(repo.is_empty());
    }
}
