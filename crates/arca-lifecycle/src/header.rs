use std::fmt;

use arca_types::{ObjectId, OwnerId, Version};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Versioning fields common to every object kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionHeader {
    pub id: ObjectId,
    pub name: String,
    /// `None` until the object is first saved.
    pub version: Option<Version>,
    pub owner: Option<OwnerId>,
    /// The version this one was derived from. A weak reference: the parent
    /// may since have been deleted.
    pub parent_version: Option<ObjectId>,
    pub created_at: DateTime<Utc>,
}

impl VersionHeader {
    /// Header for an object that has not been saved yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            version: None,
            owner: None,
            parent_version: None,
            created_at: Utc::now(),
        }
    }

    /// Saved version, or `1.0` for an object never saved.
    pub fn version_or_initial(&self) -> Version {
        self.version.unwrap_or(Version::INITIAL)
    }

    /// Fresh identity and no version or parent; name and owner carry over.
    pub(crate) fn reset_for_new_version(&mut self) {
        self.id = ObjectId::new();
        self.version = None;
        self.parent_version = None;
        self.created_at = Utc::now();
    }
}

/// An object kind managed by [`LifecycleManager`](crate::LifecycleManager).
///
/// A kind embeds a [`VersionHeader`] and adds its own fields. The manager only
/// ever touches the header; everything else is copied verbatim by
/// [`clone_for_new_version`](Versioned::clone_for_new_version).
pub trait Versioned:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Stable kind identifier, used as the capability registry key and in
    /// persisted catalogs.
    const KIND: &'static str;

    /// Human-readable label.
    const LABEL: &'static str;

    /// Whether objects of this kind may own content.
    const ACCEPTS_CONTENT: bool = true;

    fn header(&self) -> &VersionHeader;

    fn header_mut(&mut self) -> &mut VersionHeader;

    /// Text fields an indexer should read, besides content.
    fn indexable_text(&self) -> Vec<String> {
        vec![self.header().name.clone()]
    }

    /// A copy of this object's kind-specific fields with a blank header,
    /// ready to be numbered as a new version.
    fn clone_for_new_version(&self) -> Self {
        let mut next = self.clone();
        next.header_mut().reset_for_new_version();
        next
    }

    /// Attribute the object to `owner`. Later versions inherit it.
    fn with_owner(mut self, owner: OwnerId) -> Self {
        self.header_mut().owner = Some(owner);
        self
    }

    fn id(&self) -> ObjectId {
        self.header().id
    }

    fn name(&self) -> &str {
        &self.header().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_keeps_name_and_owner() {
        let owner = OwnerId::new();
        let mut h = VersionHeader::new("plan");
        h.owner = Some(owner);
        h.version = Some(Version::new(2, 3));
        h.parent_version = Some(ObjectId::new());
        let old_id = h.id;

        h.reset_for_new_version();
        assert_ne!(h.id, old_id);
        assert_eq!(h.name, "plan");
        assert_eq!(h.owner, Some(owner));
        assert!(h.version.is_none());
        assert!(h.parent_version.is_none());
    }

    #[test]
    fn unsaved_header_reads_as_initial() {
        assert_eq!(VersionHeader::new("x").version_or_initial(), Version::INITIAL);
    }
}
