//! Kind-specific behavior dispatched by kind id.
//!
//! Callers that only know a kind as a string (a CLI argument, a catalog
//! key) look up its [`KindCapabilities`] in a [`KindRegistry`] instead of
//! matching on concrete types.

use std::collections::BTreeMap;
use std::sync::Arc;

use arca_types::{ObjectId, OwnerId, Version};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LifecycleError, LifecycleResult};
use crate::header::Versioned;
use crate::manager::LifecycleManager;

/// Kind-agnostic view of one object version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub kind: String,
    pub id: ObjectId,
    pub name: String,
    pub version: Version,
    pub owner: Option<OwnerId>,
    pub parent_version: Option<ObjectId>,
    pub created_at: DateTime<Utc>,
}

impl ObjectSummary {
    pub fn of<K: Versioned>(object: &K) -> Self {
        let header = object.header();
        Self {
            kind: K::KIND.to_string(),
            id: header.id,
            name: header.name.clone(),
            version: header.version_or_initial(),
            owner: header.owner,
            parent_version: header.parent_version,
            created_at: header.created_at,
        }
    }
}

/// What a caller can do with a kind without knowing its concrete type.
pub trait KindCapabilities: Send + Sync {
    fn kind(&self) -> &'static str;

    fn label(&self) -> &'static str;

    /// Whether objects of this kind may own content.
    fn accepts_content(&self) -> bool;

    fn summary(&self, id: &ObjectId) -> LifecycleResult<ObjectSummary>;

    /// Summaries of every lineage tip.
    fn latest_summaries(&self) -> LifecycleResult<Vec<ObjectSummary>>;

    /// Summaries of `id` and its ancestors, nearest first.
    fn history(&self, id: &ObjectId) -> LifecycleResult<Vec<ObjectSummary>>;

    /// Non-content text an indexer should read for `id`.
    fn indexable_text(&self, id: &ObjectId) -> LifecycleResult<Vec<String>>;
}

impl<K: Versioned> KindCapabilities for LifecycleManager<K> {
    fn kind(&self) -> &'static str {
        K::KIND
    }

    fn label(&self) -> &'static str {
        K::LABEL
    }

    fn accepts_content(&self) -> bool {
        K::ACCEPTS_CONTENT
    }

    fn summary(&self, id: &ObjectId) -> LifecycleResult<ObjectSummary> {
        self.find_by_id(id).map(|o| ObjectSummary::of(&o))
    }

    fn latest_summaries(&self) -> LifecycleResult<Vec<ObjectSummary>> {
        Ok(self
            .find_all_latest_versions()?
            .iter()
            .map(ObjectSummary::of)
            .collect())
    }

    fn history(&self, id: &ObjectId) -> LifecycleResult<Vec<ObjectSummary>> {
        Ok(self
            .get_version_history(id)?
            .iter()
            .map(ObjectSummary::of)
            .collect())
    }

    fn indexable_text(&self, id: &ObjectId) -> LifecycleResult<Vec<String>> {
        Ok(self.find_by_id(id)?.indexable_text())
    }
}

/// Capability sets keyed by kind id.
#[derive(Clone, Default)]
pub struct KindRegistry {
    kinds: BTreeMap<&'static str, Arc<dyn KindCapabilities>>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `caps` under its own kind id, replacing any previous entry.
    pub fn register(&mut self, caps: Arc<dyn KindCapabilities>) {
        self.kinds.insert(caps.kind(), caps);
    }

    pub fn get(&self, kind: &str) -> LifecycleResult<&dyn KindCapabilities> {
        self.kinds
            .get(kind)
            .map(|c| c.as_ref())
            .ok_or_else(|| LifecycleError::UnknownKind(kind.to_string()))
    }

    /// Registered kind ids, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    /// Find which registered kind holds `id`.
    pub fn locate(&self, id: &ObjectId) -> LifecycleResult<&dyn KindCapabilities> {
        for caps in self.kinds.values() {
            match caps.summary(id) {
                Ok(_) => return Ok(caps.as_ref()),
                Err(LifecycleError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(LifecycleError::NotFound { kind: "object", id: *id })
    }
}

impl std::fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds.keys()).finish()
    }
}
