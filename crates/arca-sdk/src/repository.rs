use std::sync::Arc;

use arca_content::{Content, ContentStore, InMemoryContentRepository, StorageTarget, Upload};
use arca_filestore::{FileStoreRegistry, InMemoryFileStoreRepository};
use arca_lifecycle::{
    Document, Folder, InMemoryObjectRepository, KindRegistry, LifecycleError, LifecycleManager,
    Report, User, Versioned,
};
use arca_types::ObjectId;
use tracing::{info, warn};

use crate::catalog::{Catalog, CATALOG_FORMAT};
use crate::config::ArcaConfig;
use crate::error::{SdkError, SdkResult};

/// Repository and manager for one object kind.
struct KindStore<K: Versioned> {
    repo: Arc<InMemoryObjectRepository<K>>,
    manager: Arc<LifecycleManager<K>>,
}

impl<K: Versioned> KindStore<K> {
    fn from_rows(rows: Vec<K>) -> Self {
        let repo = Arc::new(InMemoryObjectRepository::from_rows(rows));
        let manager = Arc::new(LifecycleManager::new(repo.clone()));
        Self { repo, manager }
    }
}

/// An object kind the [`Arca`] facade manages.
pub trait ManagedKind: Versioned {
    fn manager(arca: &Arca) -> &LifecycleManager<Self>;
}

macro_rules! managed_kind {
    ($kind:ty, $field:ident) => {
        impl ManagedKind for $kind {
            fn manager(arca: &Arca) -> &LifecycleManager<Self> {
                &arca.$field.manager
            }
        }
    };
}

managed_kind!(Document, documents);
managed_kind!(Folder, folders);
managed_kind!(User, users);
managed_kind!(Report, reports);

/// High-level Arca API.
///
/// Owns every repository, wires the content store to the file store
/// registry, and keeps object and content lifecycles consistent: deleting an
/// object deletes its content, and branching a version copies its content.
pub struct Arca {
    config: ArcaConfig,
    file_stores: Arc<InMemoryFileStoreRepository>,
    contents: Arc<InMemoryContentRepository>,
    registry: Arc<FileStoreRegistry>,
    content: ContentStore,
    documents: KindStore<Document>,
    folders: KindStore<Folder>,
    users: KindStore<User>,
    reports: KindStore<Report>,
    kinds: KindRegistry,
}

impl Arca {
    /// Open the catalog named by `config`, or start empty if it does not
    /// exist yet.
    pub fn open(config: ArcaConfig) -> SdkResult<Self> {
        let catalog = Catalog::load(&config.catalog_path)?;
        info!(
            catalog = %config.catalog_path.display(),
            stores = catalog.file_stores.len(),
            contents = catalog.contents.len(),
            "opened arca"
        );
        Ok(Self::from_catalog(config, catalog))
    }

    /// An empty instance that has not touched the disk.
    pub fn in_memory(config: ArcaConfig) -> Self {
        Self::from_catalog(config, Catalog::empty())
    }

    fn from_catalog(config: ArcaConfig, catalog: Catalog) -> Self {
        let file_stores = Arc::new(InMemoryFileStoreRepository::from_rows(catalog.file_stores));
        let contents = Arc::new(InMemoryContentRepository::from_rows(catalog.contents));
        let registry = Arc::new(FileStoreRegistry::new(file_stores.clone(), contents.clone()));
        let content = ContentStore::new(contents.clone(), registry.clone());

        let documents = KindStore::from_rows(catalog.documents);
        let folders = KindStore::from_rows(catalog.folders);
        let users = KindStore::from_rows(catalog.users);
        let reports = KindStore::from_rows(catalog.reports);

        let mut kinds = KindRegistry::new();
        kinds.register(documents.manager.clone());
        kinds.register(folders.manager.clone());
        kinds.register(users.manager.clone());
        kinds.register(reports.manager.clone());

        Self {
            config,
            file_stores,
            contents,
            registry,
            content,
            documents,
            folders,
            users,
            reports,
            kinds,
        }
    }

    /// Persist every repository to the configured catalog path.
    pub fn flush(&self) -> SdkResult<()> {
        let catalog = Catalog {
            format: CATALOG_FORMAT,
            file_stores: self.file_stores.snapshot()?,
            contents: self.contents.snapshot()?,
            documents: self.documents.repo.snapshot()?,
            folders: self.folders.repo.snapshot()?,
            users: self.users.repo.snapshot()?,
            reports: self.reports.repo.snapshot()?,
        };
        catalog.save(&self.config.catalog_path)
    }

    pub fn config(&self) -> &ArcaConfig {
        &self.config
    }

    pub fn file_stores(&self) -> &FileStoreRegistry {
        &self.registry
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    pub fn objects<K: ManagedKind>(&self) -> &LifecycleManager<K> {
        K::manager(self)
    }

    // ---- Objects ----

    /// Save a new object and, if given, attach an upload as its primary
    /// content. The object is removed again if the content cannot be stored.
    pub fn create<K: ManagedKind>(
        &self,
        object: K,
        upload: Option<Upload>,
    ) -> SdkResult<(K, Option<Content>)> {
        let object = self.objects::<K>().save(object)?;
        let Some(upload) = upload else {
            return Ok((object, None));
        };
        match self.attach(&object.id(), upload) {
            Ok(content) => Ok((object, Some(content))),
            Err(e) => {
                if let Err(rollback) = self.objects::<K>().delete(&object.id()) {
                    warn!(id = %object.id(), error = %rollback, "failed to roll back object");
                }
                Err(e)
            }
        }
    }

    /// Branch a new major version and copy the source's content onto it.
    pub fn create_major_version<K: ManagedKind>(&self, source: &ObjectId) -> SdkResult<K> {
        let created = self.objects::<K>().create_major_version(source)?;
        self.copy_content(source, &created)?;
        Ok(created)
    }

    /// Branch a new minor version and copy the source's content onto it.
    pub fn create_minor_version<K: ManagedKind>(&self, source: &ObjectId) -> SdkResult<K> {
        let created = self.objects::<K>().create_minor_version(source)?;
        self.copy_content(source, &created)?;
        Ok(created)
    }

    /// Delete one version together with all content it owns.
    ///
    /// If the content rows are gone but some of their files could not be
    /// removed, the object is deleted anyway and the file error returned.
    pub fn delete<K: ManagedKind>(&self, id: &ObjectId) -> SdkResult<()> {
        let manager = self.objects::<K>();
        manager.find_by_id(id)?;
        let removed = match self.content.delete_by_owner(id) {
            Ok(removed) => removed,
            Err(e) if self.content.find_by_owner(id)?.is_empty() => {
                manager.delete(id)?;
                warn!(kind = K::KIND, id = %id, error = %e, "deleted object; content files left behind");
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        manager.delete(id)?;
        info!(kind = K::KIND, id = %id, contents = removed, "deleted object with content");
        Ok(())
    }

    /// Delete an object of any kind.
    pub fn delete_any(&self, id: &ObjectId) -> SdkResult<()> {
        match self.kinds.locate(id)?.kind() {
            Document::KIND => self.delete::<Document>(id),
            Folder::KIND => self.delete::<Folder>(id),
            User::KIND => self.delete::<User>(id),
            Report::KIND => self.delete::<Report>(id),
            other => Err(LifecycleError::UnknownKind(other.to_string()).into()),
        }
    }

    // ---- Content ----

    /// Attach an upload as primary content of `owner`, on the backend the
    /// config picks for its size.
    pub fn attach(&self, owner: &ObjectId, upload: Upload) -> SdkResult<Content> {
        let target = self.default_target(upload.data.len() as u64)?;
        self.attach_to(owner, upload, target)
    }

    /// Attach an upload as primary content of `owner` on an explicit backend.
    pub fn attach_to(
        &self,
        owner: &ObjectId,
        upload: Upload,
        target: StorageTarget,
    ) -> SdkResult<Content> {
        let caps = self.kinds.locate(owner)?;
        if !caps.accepts_content() {
            return Err(SdkError::ContentNotAccepted {
                kind: caps.kind(),
                id: *owner,
            });
        }
        if let StorageTarget::FileStore(store) = target {
            self.ensure_space(&store, upload.data.len() as u64)?;
        }
        Ok(self.content.create_from_upload(upload, *owner, target)?)
    }

    /// Primary contents of `owner`, oldest first.
    pub fn primaries(&self, owner: &ObjectId) -> SdkResult<Vec<Content>> {
        Ok(self
            .content
            .find_by_owner(owner)?
            .into_iter()
            .filter(|c| !c.is_secondary())
            .collect())
    }

    /// Everything an indexer should read for `id`: object text fields and
    /// the indexable contents.
    pub fn indexable(&self, id: &ObjectId) -> SdkResult<(Vec<String>, Vec<Content>)> {
        let text = self.kinds.locate(id)?.indexable_text(id)?;
        let contents = self.content.indexable_contents(id)?;
        Ok((text, contents))
    }

    fn default_target(&self, size: u64) -> SdkResult<StorageTarget> {
        let Some(name) = &self.config.default_file_store else {
            return Ok(StorageTarget::Inline);
        };
        if size <= self.config.inline_threshold {
            return Ok(StorageTarget::Inline);
        }
        let store = self.registry.find_by_name(name)?;
        if !store.is_active() {
            warn!(store = %name, size, "default file store inactive; storing inline");
            return Ok(StorageTarget::Inline);
        }
        Ok(StorageTarget::FileStore(store.id))
    }

    fn ensure_space(&self, store: &arca_types::FileStoreId, needed: u64) -> SdkResult<()> {
        if !self.config.check_space {
            return Ok(());
        }
        let available = self.registry.get_available_space(store)?;
        if available < needed {
            let store = self.registry.find_by_id(store)?;
            return Err(SdkError::InsufficientSpace {
                store: store.name,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Copy-on-branch: every primary of `source` (with its renditions) gets
    /// an independent copy owned by `created`. If copying fails the new
    /// version is deleted again.
    fn copy_content<K: ManagedKind>(&self, source: &ObjectId, created: &K) -> SdkResult<()> {
        let result = self.primaries(source).and_then(|primaries| {
            for primary in &primaries {
                self.content.copy_to_owner(&primary.id, created.id())?;
            }
            Ok(primaries.len())
        });
        match result {
            Ok(copied) => {
                if copied > 0 {
                    info!(source = %source, id = %created.id(), copied, "copied content to new version");
                }
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = self.delete::<K>(&created.id()) {
                    warn!(id = %created.id(), error = %rollback, "failed to roll back new version");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arca_filestore::FileStore;
    use arca_types::{ErrorClass, StorageLocation};
    use tempfile::TempDir;

    fn arca(threshold: u64) -> (Arca, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ArcaConfig {
            catalog_path: dir.path().join("catalog.json"),
            default_file_store: Some("bulk".into()),
            inline_threshold: threshold,
            check_space: true,
        };
        let arca = Arca::in_memory(config);
        arca.file_stores()
            .save(FileStore::new("bulk", dir.path().join("bulk")))
            .unwrap();
        (arca, dir)
    }

    fn upload(bytes: &[u8]) -> Upload {
        Upload::new("scan.pdf", "application/pdf", bytes.to_vec())
    }

    #[test]
    fn threshold_picks_backend() {
        let (arca, _dir) = arca(4);
        let (doc, small) = arca.create(Document::new("a"), Some(upload(b"tiny"))).unwrap();
        let large = arca.attach(&doc.id(), upload(b"larger payload")).unwrap();
        assert_eq!(small.unwrap().location(), StorageLocation::Inline);
        assert_eq!(large.location(), StorageLocation::External);
        assert_eq!(arca.primaries(&doc.id()).unwrap().len(), 2);
    }

    #[test]
    fn folders_reject_content() {
        let (arca, _dir) = arca(4);
        let err = arca
            .create(Folder::new("root", "/"), Some(upload(b"x")))
            .unwrap_err();
        assert!(matches!(err, SdkError::ContentNotAccepted { .. }));
        assert!(arca.objects::<Folder>().find_all().unwrap().is_empty());
    }

    #[test]
    fn delete_cascades_to_content() {
        let (arca, _dir) = arca(0);
        let (doc, content) = arca.create(Document::new("a"), Some(upload(b"bytes"))).unwrap();
        let content = content.unwrap();
        arca.content()
            .add_rendition(&content.id, "a.txt", b"text".to_vec(), "text/plain", true)
            .unwrap();

        arca.delete_any(&doc.id()).unwrap();
        assert!(arca.content().find_by_owner(&doc.id()).unwrap().is_empty());
        let err = arca.content().find_by_id(&content.id).unwrap_err();
        assert_eq!(err.class(), ErrorClass::NotFound);
        let store = arca.file_stores().find_by_name("bulk").unwrap();
        arca.file_stores().delete(&store.id).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn delete_removes_object_when_only_files_fail() {
        let (arca, _dir) = arca(0);
        let (doc, content) = arca.create(Document::new("a"), Some(upload(b"bytes"))).unwrap();
        let content = content.unwrap();
        let (store_id, shard_path) = content.payload.external().unwrap();
        let path = arca.file_stores().resolve_path(store_id, shard_path).unwrap();
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("stray"), b"x").unwrap();

        let err = arca.delete_any(&doc.id()).unwrap_err();
        assert_eq!(err.class(), ErrorClass::StorageIo);
        assert!(arca.content().find_by_owner(&doc.id()).unwrap().is_empty());
        assert!(!arca.objects::<Document>().exists(&doc.id()).unwrap());
    }

    #[test]
    fn owner_attribution_survives_branching() {
        let (arca, _dir) = arca(0);
        let owner = arca_types::OwnerId::new();
        let (v1, _) = arca.create(Document::new("a").with_owner(owner), None).unwrap();
        let v2: Document = arca.create_major_version(&v1.id()).unwrap();
        assert_eq!(v2.header().owner, Some(owner));
        assert_eq!(arca.kinds().locate(&v2.id()).unwrap().summary(&v2.id()).unwrap().owner, Some(owner));
    }

    #[test]
    fn branch_copies_content() {
        let (arca, _dir) = arca(0);
        let (v1, content) = arca.create(Document::new("a"), Some(upload(b"v1 bytes"))).unwrap();
        let content = content.unwrap();
        arca.content()
            .add_rendition(&content.id, "a.txt", b"text".to_vec(), "text/plain", true)
            .unwrap();

        let v2: Document = arca.create_major_version(&v1.id()).unwrap();
        let copied = arca.content().find_by_owner(&v2.id()).unwrap();
        assert_eq!(copied.len(), 2);
        let primary = &copied[0];
        assert_ne!(primary.id, content.id);

        arca.content()
            .update_primary_content(&primary.id, b"v2 bytes".to_vec())
            .unwrap();
        assert_eq!(arca.content().get_bytes(&content.id).unwrap(), b"v1 bytes");
        assert_eq!(arca.content().get_all_renditions(&content.id).unwrap().len(), 2);

        let v21: Document = arca.create_minor_version(&v2.id()).unwrap();
        assert_eq!(arca.primaries(&v21.id()).unwrap().len(), 1);
    }

    #[test]
    fn insufficient_space_is_reported() {
        let (arca, _dir) = arca(0);
        let store = arca.file_stores().find_by_name("bulk").unwrap();
        let available = arca.file_stores().get_available_space(&store.id).unwrap();
        let err = arca.ensure_space(&store.id, available.saturating_add(1 << 40)).unwrap_err();
        assert!(matches!(err, SdkError::InsufficientSpace { .. }));
        assert_eq!(err.class(), ErrorClass::StorageIo);
        arca.ensure_space(&store.id, 1).unwrap();
    }

    #[test]
    fn flush_and_reopen() {
        let (arca, _dir) = arca(0);
        let (doc, content) = arca.create(Document::new("a"), Some(upload(b"persisted"))).unwrap();
        arca.objects::<User>().save(User::new("ada", "ada@example.com")).unwrap();
        arca.flush().unwrap();

        let reopened = Arca::open(arca.config().clone()).unwrap();
        assert_eq!(reopened.objects::<Document>().find_by_id(&doc.id()).unwrap().name(), "a");
        assert_eq!(reopened.objects::<User>().find_all().unwrap().len(), 1);
        assert_eq!(
            reopened.content().get_bytes(&content.unwrap().id).unwrap(),
            b"persisted"
        );
        let (text, contents) = reopened.indexable(&doc.id()).unwrap();
        assert_eq!(text, vec!["a"]);
        assert_eq!(contents.len(), 1);
    }
}
