//! In-memory file store repository.
//!
//! [`InMemoryFileStoreRepository`] keeps rows in a `HashMap` behind a
//! `RwLock`. The SDK persists it by taking a [`snapshot`] and rebuilding it
//! with [`from_rows`].
//!
//! [`snapshot`]: InMemoryFileStoreRepository::snapshot
//! [`from_rows`]: InMemoryFileStoreRepository::from_rows

use std::collections::HashMap;
use std::sync::RwLock;

use arca_types::FileStoreId;

use crate::error::{FileStoreError, FileStoreResult};
use crate::model::FileStore;
use crate::traits::FileStoreRepository;

#[derive(Debug, Default)]
pub struct InMemoryFileStoreRepository {
    rows: RwLock<HashMap<FileStoreId, FileStore>>,
}

impl InMemoryFileStoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a repository from previously snapshotted rows.
    pub fn from_rows(rows: impl IntoIterator<Item = FileStore>) -> Self {
        Self {
            rows: RwLock::new(rows.into_iter().map(|s| (s.id, s)).collect()),
        }
    }

    /// Copy of every row, ordered by name.
    pub fn snapshot(&self) -> FileStoreResult<Vec<FileStore>> {
        self.find_all()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> FileStoreError {
    FileStoreError::Backend(format!("lock poisoned: {e}"))
}

impl FileStoreRepository for InMemoryFileStoreRepository {
    fn find_by_id(&self, id: &FileStoreId) -> FileStoreResult<Option<FileStore>> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.get(id).cloned())
    }

    fn find_by_name(&self, name: &str) -> FileStoreResult<Option<FileStore>> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.values().find(|s| s.name == name).cloned())
    }

    fn find_all(&self) -> FileStoreResult<Vec<FileStore>> {
        let rows = self.rows.read().map_err(poisoned)?;
        let mut all: Vec<FileStore> = rows.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn save(&self, store: &FileStore) -> FileStoreResult<()> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        if rows.values().any(|s| s.name == store.name && s.id != store.id) {
            return Err(FileStoreError::DuplicateName(store.name.clone()));
        }
        rows.insert(store.id, store.clone());
        Ok(())
    }

    fn delete(&self, id: &FileStoreId) -> FileStoreResult<bool> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        Ok(rows.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_find() {
        let repo = InMemoryFileStoreRepository::new();
        let store = FileStore::new("a", "/tmp/a");
        repo.save(&store).unwrap();
        assert_eq!(repo.find_by_id(&store.id).unwrap(), Some(store.clone()));
        assert_eq!(repo.find_by_name("a").unwrap(), Some(store.clone()));
        assert!(repo.exists(&store.id).unwrap());
    }

    #[test]
    fn unique_name_is_enforced() {
        let repo = InMemoryFileStoreRepository::new();
        repo.save(&FileStore::new("a", "/tmp/a")).unwrap();
        let err = repo.save(&FileStore::new("a", "/tmp/b")).unwrap_err();
        assert!(matches!(err, FileStoreError::DuplicateName(_)));
    }

    #[test]
    fn update_keeps_name() {
        let repo = InMemoryFileStoreRepository::new();
        let mut store = FileStore::new("a", "/tmp/a");
        repo.save(&store).unwrap();
        store.status = arca_types::FileStoreStatus::Inactive;
        repo.save(&store).unwrap();
        assert!(!repo.find_by_id(&store.id).unwrap().unwrap().is_active());
    }

    #[test]
    fn find_all_sorted_and_snapshot_restores() {
        let repo = InMemoryFileStoreRepository::new();
        repo.save(&FileStore::new("zeta", "/z")).unwrap();
        repo.save(&FileStore::new("alpha", "/a")).unwrap();
        let names: Vec<String> = repo.find_all().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);

        let restored = InMemoryFileStoreRepository::from_rows(repo.snapshot().unwrap());
        assert_eq!(restored.find_all().unwrap().len(), 2);
    }

    #[test]
    fn delete_reports_existence() {
        let repo = InMemoryFileStoreRepository::new();
        let store = FileStore::new("a", "/tmp/a");
        repo.save(&store).unwrap();
        assert!(repo.delete(&store.id).unwrap());
        assert!(!repo.delete(&store.id).unwrap());
    }
}
