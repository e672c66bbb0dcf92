use std::collections::HashSet;
use std::sync::Arc;

use arca_types::{ObjectId, Version};
use tracing::{debug, info};

use crate::error::{LifecycleError, LifecycleResult};
use crate::header::Versioned;
use crate::locks::LineageLocks;
use crate::traits::ObjectRepository;

/// Lifecycle engine for one object kind.
///
/// Versions of a name form a lineage. New versions are numbered by scanning
/// every version of the name, so numbers never repeat even when intermediate
/// versions were deleted. Allocation for a name runs under that name's
/// lineage lock; the repository's unique (name, major, minor) constraint
/// backs it up.
pub struct LifecycleManager<K: Versioned> {
    repo: Arc<dyn ObjectRepository<K>>,
    locks: LineageLocks,
}

impl<K: Versioned> LifecycleManager<K> {
    pub fn new(repo: Arc<dyn ObjectRepository<K>>) -> Self {
        Self {
            repo,
            locks: LineageLocks::new(),
        }
    }

    /// Persist an object. A never-saved object becomes version `1.0`; an
    /// already versioned one is written as is.
    pub fn save(&self, mut object: K) -> LifecycleResult<K> {
        let name = object.name().to_string();
        if name.trim().is_empty() {
            return Err(LifecycleError::InvalidName(name));
        }
        if object.header().version.is_some() {
            self.repo.save(&object)?;
            debug!(kind = K::KIND, id = %object.id(), "saved object");
            return Ok(object);
        }

        self.locks.with_lock(&name, || {
            let header = object.header_mut();
            header.version = Some(Version::INITIAL);
            header.parent_version = None;
            self.repo.save(&object)
        })?;
        info!(kind = K::KIND, id = %object.id(), name = %name, "created object at 1.0");
        Ok(object)
    }

    pub fn find_by_id(&self, id: &ObjectId) -> LifecycleResult<K> {
        self.repo
            .find_by_id(id)?
            .ok_or(LifecycleError::NotFound { kind: K::KIND, id: *id })
    }

    pub fn exists(&self, id: &ObjectId) -> LifecycleResult<bool> {
        self.repo.exists(id)
    }

    pub fn find_all(&self) -> LifecycleResult<Vec<K>> {
        self.repo.find_all()
    }

    /// The tip of every lineage: versions no other version derives from.
    pub fn find_all_latest_versions(&self) -> LifecycleResult<Vec<K>> {
        self.repo.find_latest_per_name()
    }

    /// Every version of `name`, highest first.
    pub fn find_by_name(&self, name: &str) -> LifecycleResult<Vec<K>> {
        self.repo.find_by_name(name)
    }

    /// The highest version of `name`, if any exists.
    pub fn latest_of(&self, name: &str) -> LifecycleResult<Option<K>> {
        Ok(self.repo.find_by_name(name)?.into_iter().next())
    }

    /// Derive `(max major of the name) + 1 . 0` from `source`.
    pub fn create_major_version(&self, source: &ObjectId) -> LifecycleResult<K> {
        self.derive(source, |current, siblings| {
            let max_major = siblings
                .iter()
                .map(|v| v.major)
                .chain(std::iter::once(current.major))
                .max()
                .unwrap_or(current.major);
            max_major.checked_add(1).map(Version::major_only)
        })
    }

    /// Derive `major . (max minor under that major) + 1` from `source`.
    pub fn create_minor_version(&self, source: &ObjectId) -> LifecycleResult<K> {
        self.derive(source, |current, siblings| {
            let max_minor = siblings
                .iter()
                .filter(|v| v.major == current.major)
                .map(|v| v.minor)
                .chain(std::iter::once(current.minor))
                .max()
                .unwrap_or(current.minor);
            max_minor.checked_add(1).map(|minor| Version::new(current.major, minor))
        })
    }

    /// `source` followed by its ancestors, nearest first.
    ///
    /// The walk stops at a version with no parent or whose parent was
    /// deleted. A parent chain that revisits a version, or whose versions do
    /// not strictly decrease, is reported as [`LifecycleError::CorruptLineage`].
    pub fn get_version_history(&self, source: &ObjectId) -> LifecycleResult<Vec<K>> {
        let mut current = self.find_by_id(source)?;
        let mut seen = HashSet::from([current.id()]);
        let mut history = Vec::new();

        while let Some(parent_id) = current.header().parent_version {
            if !seen.insert(parent_id) {
                return Err(LifecycleError::CorruptLineage {
                    id: *source,
                    reason: format!("parent chain revisits {parent_id}"),
                });
            }
            let Some(parent) = self.repo.find_by_id(&parent_id)? else {
                break;
            };
            if parent.header().version_or_initial() >= current.header().version_or_initial() {
                return Err(LifecycleError::CorruptLineage {
                    id: *source,
                    reason: format!(
                        "parent {} is not older than child {}",
                        parent.header().version_or_initial(),
                        current.header().version_or_initial()
                    ),
                });
            }
            history.push(std::mem::replace(&mut current, parent));
        }
        history.push(current);
        Ok(history)
    }

    /// Delete one version. Descendants keep a dangling parent reference.
    pub fn delete(&self, id: &ObjectId) -> LifecycleResult<()> {
        if !self.repo.delete(id)? {
            return Err(LifecycleError::NotFound { kind: K::KIND, id: *id });
        }
        info!(kind = K::KIND, id = %id, "deleted object");
        Ok(())
    }

    /// Versions derived directly from `parent`.
    pub fn find_child_versions(&self, parent: &ObjectId) -> LifecycleResult<Vec<K>> {
        self.repo.find_children(parent)
    }

    fn derive(
        &self,
        source: &ObjectId,
        next_version: impl FnOnce(Version, &[Version]) -> Option<Version>,
    ) -> LifecycleResult<K> {
        let name = self.find_by_id(source)?.name().to_string();

        let created = self.locks.with_lock(&name, || {
            // Reload under the lock; the source may have been deleted.
            let current = self.find_by_id(source)?;
            let siblings: Vec<Version> = self
                .repo
                .find_by_name(&name)?
                .iter()
                .map(|v| v.header().version_or_initial())
                .collect();
            let current_version = current.header().version_or_initial();
            let version = next_version(current_version, &siblings).ok_or_else(|| {
                LifecycleError::VersionExhausted {
                    name: name.clone(),
                    current: current_version,
                }
            })?;

            let mut next = current.clone_for_new_version();
            let header = next.header_mut();
            header.version = Some(version);
            header.parent_version = Some(current.id());
            self.repo.save(&next)?;
            Ok(next)
        })?;

        info!(
            kind = K::KIND,
            source = %source,
            id = %created.id(),
            version = %created.header().version_or_initial(),
            "created version"
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{Document, Folder};
    use crate::memory::InMemoryObjectRepository;
    use arca_types::ErrorClass;
    use std::thread;

    fn manager() -> (LifecycleManager<Document>, Arc<InMemoryObjectRepository<Document>>) {
        let repo = Arc::new(InMemoryObjectRepository::new());
        (LifecycleManager::new(repo.clone()), repo)
    }

    fn version(d: &Document) -> Version {
        d.header.version.unwrap()
    }

    #[test]
    fn new_object_saves_as_initial() {
        let (m, _) = manager();
        let d = m.save(Document::new("spec")).unwrap();
        assert_eq!(version(&d), Version::INITIAL);
        assert!(d.header.parent_version.is_none());
        assert!(m.exists(&d.id()).unwrap());
    }

    #[test]
    fn save_rejects_blank_name() {
        let (m, _) = manager();
        let err = m.save(Document::new("  ")).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Validation);
    }

    #[test]
    fn versioned_object_saved_as_is() {
        let (m, _) = manager();
        let mut d = m.save(Document::new("spec")).unwrap();
        d.description = "edited".into();
        let d = m.save(d).unwrap();
        assert_eq!(version(&d), Version::INITIAL);
        assert_eq!(m.find_by_id(&d.id()).unwrap().description, "edited");
    }

    #[test]
    fn major_version_uses_max_of_name() {
        let (m, _) = manager();
        let v1 = m.save(Document::new("spec")).unwrap();
        let v2 = m.create_major_version(&v1.id()).unwrap();
        // Branch again from 1.0: numbering skips past 2.0.
        let v3 = m.create_major_version(&v1.id()).unwrap();

        assert_eq!(version(&v2), Version::new(2, 0));
        assert_eq!(version(&v3), Version::new(3, 0));
        assert_eq!(v3.header.parent_version, Some(v1.id()));
    }

    #[test]
    fn major_version_tolerates_gaps() {
        let (m, _) = manager();
        let v1 = m.save(Document::new("spec")).unwrap();
        let v2 = m.create_major_version(&v1.id()).unwrap();
        let v3 = m.create_major_version(&v2.id()).unwrap();
        m.delete(&v2.id()).unwrap();
        let v4 = m.create_major_version(&v1.id()).unwrap();
        assert_eq!(version(&v3), Version::new(3, 0));
        assert_eq!(version(&v4), Version::new(4, 0));
    }

    #[test]
    fn minor_version_scoped_to_major() {
        let (m, _) = manager();
        let v1 = m.save(Document::new("spec")).unwrap();
        let v11 = m.create_minor_version(&v1.id()).unwrap();
        let v2 = m.create_major_version(&v11.id()).unwrap();
        let v12 = m.create_minor_version(&v1.id()).unwrap();
        let v21 = m.create_minor_version(&v2.id()).unwrap();

        assert_eq!(version(&v11), Version::new(1, 1));
        assert_eq!(version(&v12), Version::new(1, 2));
        assert_eq!(version(&v21), Version::new(2, 1));
        assert_eq!(v12.header.parent_version, Some(v1.id()));
    }

    #[test]
    fn exhausted_version_numbers_are_rejected() {
        let (m, repo) = manager();
        let mut top = Document::new("spec");
        top.header.version = Some(Version::new(u32::MAX, u32::MAX));
        let top = m.save(top).unwrap();

        let err = m.create_major_version(&top.id()).unwrap_err();
        assert!(matches!(err, LifecycleError::VersionExhausted { .. }));
        assert_eq!(err.class(), ErrorClass::InvalidState);
        let err = m.create_minor_version(&top.id()).unwrap_err();
        assert!(matches!(err, LifecycleError::VersionExhausted { .. }));
        assert_eq!(repo.find_all().unwrap().len(), 1);
    }

    #[test]
    fn new_version_copies_fields() {
        let (m, _) = manager();
        let mut d = Document::new("spec");
        d.tags = vec!["draft".into()];
        let v1 = m.save(d).unwrap();
        let v2 = m.create_minor_version(&v1.id()).unwrap();
        assert_eq!(v2.tags, vec!["draft"]);
        assert_ne!(v2.id(), v1.id());
    }

    #[test]
    fn owner_carries_to_new_versions() {
        let (m, _) = manager();
        let owner = arca_types::OwnerId::new();
        let v1 = m.save(Document::new("spec").with_owner(owner)).unwrap();
        let v2 = m.create_major_version(&v1.id()).unwrap();
        assert_eq!(v2.header.owner, Some(owner));
    }

    #[test]
    fn history_walks_to_root() {
        let (m, _) = manager();
        let v1 = m.save(Document::new("spec")).unwrap();
        let v11 = m.create_minor_version(&v1.id()).unwrap();
        let v2 = m.create_major_version(&v11.id()).unwrap();
        let v21 = m.create_minor_version(&v2.id()).unwrap();

        let history = m.get_version_history(&v21.id()).unwrap();
        let versions: Vec<Version> = history.iter().map(version).collect();
        assert_eq!(
            versions,
            vec![
                Version::new(2, 1),
                Version::new(2, 0),
                Version::new(1, 1),
                Version::new(1, 0)
            ]
        );
        assert!(versions.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn history_stops_at_deleted_parent() {
        let (m, _) = manager();
        let v1 = m.save(Document::new("spec")).unwrap();
        let v11 = m.create_minor_version(&v1.id()).unwrap();
        let v12 = m.create_minor_version(&v11.id()).unwrap();
        m.delete(&v11.id()).unwrap();

        let history = m.get_version_history(&v12.id()).unwrap();
        assert_eq!(history.len(), 1);
        assert!(m.find_by_id(&v1.id()).is_ok(), "deleting a child never deletes its parent");
    }

    #[test]
    fn cyclic_lineage_is_corrupt() {
        let (m, repo) = manager();
        let v1 = m.save(Document::new("spec")).unwrap();
        let v11 = m.create_minor_version(&v1.id()).unwrap();

        let mut looped = v1.clone();
        looped.header.parent_version = Some(v11.id());
        repo.save(&looped).unwrap();

        let err = m.get_version_history(&v11.id()).unwrap_err();
        assert!(matches!(err, LifecycleError::CorruptLineage { .. }));
        assert_eq!(err.class(), ErrorClass::InvalidState);
    }

    #[test]
    fn self_parent_is_corrupt() {
        let (m, repo) = manager();
        let mut v1 = m.save(Document::new("spec")).unwrap();
        v1.header.parent_version = Some(v1.id());
        repo.save(&v1).unwrap();
        assert!(matches!(
            m.get_version_history(&v1.id()),
            Err(LifecycleError::CorruptLineage { .. })
        ));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (m, _) = manager();
        let err = m.delete(&ObjectId::new()).unwrap_err();
        assert_eq!(err.class(), ErrorClass::NotFound);
    }

    #[test]
    fn children_and_latest() {
        let (m, _) = manager();
        let v1 = m.save(Document::new("spec")).unwrap();
        let a = m.create_minor_version(&v1.id()).unwrap();
        let b = m.create_major_version(&v1.id()).unwrap();
        m.save(Document::new("notes")).unwrap();

        let children: Vec<ObjectId> = m
            .find_child_versions(&v1.id())
            .unwrap()
            .iter()
            .map(|d| d.id())
            .collect();
        assert_eq!(children, vec![a.id(), b.id()]);

        let latest = m.find_all_latest_versions().unwrap();
        let names: Vec<(&str, Version)> = latest.iter().map(|d| (d.name(), version(d))).collect();
        assert_eq!(
            names,
            vec![
                ("notes", Version::INITIAL),
                ("spec", Version::new(2, 0)),
                ("spec", Version::new(1, 1)),
            ]
        );
        assert_eq!(version(&m.latest_of("spec").unwrap().unwrap()), Version::new(2, 0));
        assert!(m.latest_of("missing").unwrap().is_none());
        assert_eq!(m.find_by_name("spec").unwrap().len(), 3);
        assert_eq!(m.find_all().unwrap().len(), 4);
    }

    #[test]
    fn second_new_object_with_same_name_conflicts() {
        let (m, _) = manager();
        m.save(Document::new("spec")).unwrap();
        let err = m.save(Document::new("spec")).unwrap_err();
        assert!(matches!(err, LifecycleError::DuplicateVersion { .. }));
    }

    #[test]
    fn concurrent_major_versions_are_distinct() {
        let (m, _) = manager();
        let m = Arc::new(m);
        let root = m.save(Document::new("spec")).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let m = Arc::clone(&m);
                let id = root.id();
                thread::spawn(move || m.create_major_version(&id).unwrap())
            })
            .collect();
        let mut majors: Vec<u32> = handles
            .into_iter()
            .map(|h| version(&h.join().unwrap()).major)
            .collect();
        majors.sort_unstable();
        assert_eq!(majors, (2..=17).collect::<Vec<u32>>());
    }

    #[test]
    fn kinds_are_independent() {
        let docs = manager().0;
        let folders: LifecycleManager<Folder> =
            LifecycleManager::new(Arc::new(InMemoryObjectRepository::new()));
        let d = docs.save(Document::new("shared")).unwrap();
        let f = folders.save(Folder::new("shared", "/a")).unwrap();
        assert!(matches!(
            folders.find_by_id(&d.id()),
            Err(LifecycleError::NotFound { kind: "folder", .. })
        ));
        assert_eq!(version(&d), f.header.version.unwrap());
    }
}
