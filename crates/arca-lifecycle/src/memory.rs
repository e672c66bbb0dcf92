//! In-memory object repository.
//!
//! One [`InMemoryObjectRepository`] per kind. Rows live in a `HashMap`
//! behind a `RwLock`; the unique (name, major, minor) check and the insert
//! happen under the same write lock.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use arca_types::ObjectId;

use crate::error::{LifecycleError, LifecycleResult};
use crate::header::Versioned;
use crate::traits::ObjectRepository;

#[derive(Debug)]
pub struct InMemoryObjectRepository<K> {
    rows: RwLock<HashMap<ObjectId, K>>,
}

impl<K: Versioned> InMemoryObjectRepository<K> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuild a repository from previously snapshotted rows.
    pub fn from_rows(rows: impl IntoIterator<Item = K>) -> Self {
        Self {
            rows: RwLock::new(rows.into_iter().map(|o| (o.id(), o)).collect()),
        }
    }

    /// Copy of every row, ordered by name then version.
    pub fn snapshot(&self) -> LifecycleResult<Vec<K>> {
        self.find_all()
    }
}

impl<K: Versioned> Default for InMemoryObjectRepository<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> LifecycleError {
    LifecycleError::Backend(format!("lock poisoned: {e}"))
}

fn version_key<K: Versioned>(o: &K) -> arca_types::Version {
    o.header().version_or_initial()
}

impl<K: Versioned> ObjectRepository<K> for InMemoryObjectRepository<K> {
    fn find_by_id(&self, id: &ObjectId) -> LifecycleResult<Option<K>> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.get(id).cloned())
    }

    fn find_by_name(&self, name: &str) -> LifecycleResult<Vec<K>> {
        let rows = self.rows.read().map_err(poisoned)?;
        let mut matching: Vec<K> = rows.values().filter(|o| o.name() == name).cloned().collect();
        matching.sort_by_key(|o| Reverse(version_key(o)));
        Ok(matching)
    }

    fn find_latest_per_name(&self) -> LifecycleResult<Vec<K>> {
        let rows = self.rows.read().map_err(poisoned)?;
        let parents: HashSet<ObjectId> = rows
            .values()
            .filter_map(|o| o.header().parent_version)
            .collect();
        let mut tips: Vec<K> = rows
            .values()
            .filter(|o| !parents.contains(&o.id()))
            .cloned()
            .collect();
        tips.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| version_key(b).cmp(&version_key(a)))
        });
        Ok(tips)
    }

    fn find_all(&self) -> LifecycleResult<Vec<K>> {
        let rows = self.rows.read().map_err(poisoned)?;
        let mut all: Vec<K> = rows.values().cloned().collect();
        all.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| version_key(a).cmp(&version_key(b)))
        });
        Ok(all)
    }

    fn find_children(&self, parent: &ObjectId) -> LifecycleResult<Vec<K>> {
        let rows = self.rows.read().map_err(poisoned)?;
        let mut children: Vec<K> = rows
            .values()
            .filter(|o| o.header().parent_version.as_ref() == Some(parent))
            .cloned()
            .collect();
        children.sort_by_key(version_key);
        Ok(children)
    }

    fn save(&self, object: &K) -> LifecycleResult<()> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        let version = version_key(object);
        let clash = rows.values().any(|o| {
            o.id() != object.id() && o.name() == object.name() && version_key(o) == version
        });
        if clash {
            return Err(LifecycleError::DuplicateVersion {
                name: object.name().to_string(),
                version,
            });
        }
        rows.insert(object.id(), object.clone());
        Ok(())
    }

    fn delete(&self, id: &ObjectId) -> LifecycleResult<bool> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        Ok(rows.remove(id).is_some())
    }
}
