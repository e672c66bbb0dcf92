use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;

use arca_filestore::{FileStore, FileStoreRegistry};
use arca_shard::{cleanup_after_delete, ShardAllocator, ShardPath};
use arca_types::{ContentId, FileStoreId, ObjectId};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{ContentError, ContentResult};
use crate::hash::TextHasher;
use crate::model::{Content, Payload, StorageTarget, Upload};
use crate::traits::ContentRepository;

/// Public operations on content and renditions.
///
/// The store coordinates three things: metadata rows (through a
/// [`ContentRepository`]), file stores (through the [`FileStoreRegistry`]),
/// and the files themselves. Every write to a file store happens before
/// the metadata that references it is committed; every delete removes the
/// metadata before the file.
pub struct ContentStore {
    repo: Arc<dyn ContentRepository>,
    registry: Arc<FileStoreRegistry>,
    allocator: ShardAllocator,
}

impl ContentStore {
    pub fn new(repo: Arc<dyn ContentRepository>, registry: Arc<FileStoreRegistry>) -> Self {
        Self {
            repo,
            registry,
            allocator: ShardAllocator::new(),
        }
    }

    pub fn registry(&self) -> &FileStoreRegistry {
        &self.registry
    }

    // ---------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------

    /// Store `bytes` inside the metadata row as a new primary content.
    pub fn create_inline(
        &self,
        bytes: Vec<u8>,
        name: &str,
        mime_type: &str,
        owner: ObjectId,
    ) -> ContentResult<Content> {
        validate_name(name)?;
        let size = bytes.len() as u64;
        let content = Content::primary(
            name.to_string(),
            mime_type.to_string(),
            owner,
            Payload::Inline { data: bytes },
            size,
        );
        let content = self.repo.insert(content)?;
        info!(content = %content.id, owner = %owner, size, "created inline content");
        Ok(content)
    }

    /// Write `bytes` into an active file store and record a new primary
    /// content pointing at it.
    pub fn create_external(
        &self,
        bytes: &[u8],
        name: &str,
        mime_type: &str,
        owner: ObjectId,
        file_store: &FileStoreId,
    ) -> ContentResult<Content> {
        validate_name(name)?;
        let content = Content::primary(
            name.to_string(),
            mime_type.to_string(),
            owner,
            Payload::Inline { data: Vec::new() },
            bytes.len() as u64,
        );
        let content = self
            .registry
            .with_active(file_store, |store| self.write_and_insert(store, content, bytes))?;
        info!(
            content = %content.id,
            owner = %owner,
            store = %file_store,
            size = content.size,
            "created external content"
        );
        Ok(content)
    }

    /// Create a primary content from an upload on the requested backend.
    pub fn create_from_upload(
        &self,
        upload: Upload,
        owner: ObjectId,
        target: StorageTarget,
    ) -> ContentResult<Content> {
        match target {
            StorageTarget::Inline => {
                self.create_inline(upload.data, &upload.filename, &upload.mime_type, owner)
            }
            StorageTarget::FileStore(store) => self.create_external(
                &upload.data,
                &upload.filename,
                &upload.mime_type,
                owner,
                &store,
            ),
        }
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    pub fn find_by_id(&self, id: &ContentId) -> ContentResult<Content> {
        self.repo.find_by_id(id)?.ok_or(ContentError::NotFound(*id))
    }

    /// Every content owned by `owner`, primaries and renditions alike.
    pub fn find_by_owner(&self, owner: &ObjectId) -> ContentResult<Vec<Content>> {
        self.repo.find_by_owner(owner)
    }

    /// The bytes of a content, from whichever backend holds them.
    ///
    /// A missing or unreadable file is a [`ContentError::StorageIo`], not a
    /// `NotFound`: the row exists, its storage is broken.
    pub fn get_bytes(&self, id: &ContentId) -> ContentResult<Vec<u8>> {
        let content = self.find_by_id(id)?;
        self.read_payload(&content)
    }

    // ---------------------------------------------------------------
    // Renditions
    // ---------------------------------------------------------------

    /// Attach an inline secondary rendition to a primary content.
    pub fn add_rendition(
        &self,
        primary: &ContentId,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
        is_indexable: bool,
    ) -> ContentResult<Content> {
        let primary = self.rendition_target(primary)?;
        validate_name(name)?;
        let size = bytes.len() as u64;
        let rendition = secondary_of(
            &primary,
            name,
            mime_type,
            is_indexable,
            Payload::Inline { data: bytes },
            size,
        );
        let rendition = self.repo.insert(rendition)?;
        debug!(rendition = %rendition.id, primary = %primary.id, "added inline rendition");
        Ok(rendition)
    }

    /// Attach a secondary rendition stored in a file store. The backend is
    /// independent of the primary's.
    pub fn add_rendition_external(
        &self,
        primary: &ContentId,
        name: &str,
        bytes: &[u8],
        mime_type: &str,
        is_indexable: bool,
        file_store: &FileStoreId,
    ) -> ContentResult<Content> {
        let primary = self.rendition_target(primary)?;
        validate_name(name)?;
        let rendition = secondary_of(
            &primary,
            name,
            mime_type,
            is_indexable,
            Payload::Inline { data: Vec::new() },
            bytes.len() as u64,
        );
        let rendition = self
            .registry
            .with_active(file_store, |store| self.write_and_insert(store, rendition, bytes))?;
        debug!(
            rendition = %rendition.id,
            primary = %primary.id,
            store = %file_store,
            "added external rendition"
        );
        Ok(rendition)
    }

    /// The primary followed by its secondaries in creation order.
    pub fn get_all_renditions(&self, primary: &ContentId) -> ContentResult<Vec<Content>> {
        let primary = self.find_primary(primary)?;
        let mut all = vec![primary.clone()];
        all.extend(self.repo.find_secondaries(&primary.id)?);
        Ok(all)
    }

    /// Delete every secondary of `primary`. Returns how many were removed.
    pub fn remove_secondary_renditions(&self, primary: &ContentId) -> ContentResult<usize> {
        let primary = self.find_primary(primary)?;
        let secondaries = self.repo.find_secondaries(&primary.id)?;
        let removed = self.delete_rows_and_files(&secondaries)?;
        if removed > 0 {
            debug!(primary = %primary.id, removed, "removed secondary renditions");
        }
        Ok(removed)
    }

    /// Replace a primary's bytes in its current backend and drop its now
    /// stale renditions.
    ///
    /// External content is rewritten at the same shard path via a synced
    /// temp file and an atomic rename, so readers see either the old or the
    /// new bytes. The stored text hash is cleared.
    pub fn update_primary_content(
        &self,
        primary: &ContentId,
        new_bytes: Vec<u8>,
    ) -> ContentResult<Content> {
        let mut content = self.find_primary(primary)?;
        content.size = new_bytes.len() as u64;
        content.content_hash = None;

        match content.payload.external() {
            Some((file_store, shard_path)) => {
                let store = self.registry.require_active(file_store)?;
                write_durably(&store, content.id, shard_path, &new_bytes)?;
            }
            None => content.payload = Payload::Inline { data: new_bytes },
        }
        self.repo.update(&content)?;
        self.remove_secondary_renditions(&content.id)?;
        info!(content = %content.id, size = content.size, "replaced primary content");
        Ok(content)
    }

    // ---------------------------------------------------------------
    // Deletion
    // ---------------------------------------------------------------

    /// Delete a content. A primary takes all its secondaries with it.
    pub fn delete(&self, id: &ContentId) -> ContentResult<()> {
        let content = self.find_by_id(id)?;
        let mut doomed = if content.is_secondary() {
            Vec::new()
        } else {
            self.repo.find_secondaries(&content.id)?
        };
        doomed.push(content);
        self.delete_rows_and_files(&doomed)?;
        info!(content = %id, removed = doomed.len(), "deleted content");
        Ok(())
    }

    /// Delete everything owned by `owner`. Returns how many rows went away.
    pub fn delete_by_owner(&self, owner: &ObjectId) -> ContentResult<usize> {
        let owned = self.repo.find_by_owner(owner)?;
        let removed = self.delete_rows_and_files(&owned)?;
        if removed > 0 {
            info!(owner = %owner, removed, "deleted owned content");
        }
        Ok(removed)
    }

    // ---------------------------------------------------------------
    // Cross-backend moves
    // ---------------------------------------------------------------

    /// Move inline bytes into a file store.
    pub fn move_to_file_store(
        &self,
        id: &ContentId,
        file_store: &FileStoreId,
    ) -> ContentResult<Content> {
        let mut content = self.find_by_id(id)?;
        let data = match &content.payload {
            Payload::External { .. } => return Err(ContentError::AlreadyExternal(*id)),
            Payload::Inline { data } => data.clone(),
        };
        self.registry.with_active(file_store, |store| {
            content.payload = self.write_new_file(store, content.id, &content.name, &data)?;
            self.repo
                .update(&content)
                .inspect_err(|_| discard_file(store, &content.payload))
        })?;
        info!(content = %id, store = %file_store, "moved content to file store");
        Ok(content)
    }

    /// Move external bytes back into the metadata row.
    ///
    /// The old file is removed after the row stops referencing it. A failure
    /// to remove it leaves an unreferenced file behind and is only logged.
    pub fn move_to_database(&self, id: &ContentId) -> ContentResult<Content> {
        let mut content = self.find_by_id(id)?;
        let (store_id, shard_path) = match &content.payload {
            Payload::Inline { .. } => return Err(ContentError::AlreadyInline(*id)),
            Payload::External {
                file_store,
                shard_path,
            } => (*file_store, shard_path.clone()),
        };
        let data = self.read_payload(&content)?;
        content.size = data.len() as u64;
        content.payload = Payload::Inline { data };
        self.repo.update(&content)?;

        match self.registry.find_by_id(&store_id) {
            Ok(store) => {
                if let Err(e) = cleanup_after_delete(store.root(), &shard_path) {
                    warn!(content = %id, error = %e, "left unreferenced file after move to database");
                }
            }
            Err(e) => warn!(content = %id, error = %e, "store vanished during move to database"),
        }
        info!(content = %id, store = %store_id, "moved content to database");
        Ok(content)
    }

    // ---------------------------------------------------------------
    // Copy-on-branch
    // ---------------------------------------------------------------

    /// Copy a primary and its renditions to a new owner.
    ///
    /// Every copy is a new row with its own bytes: external payloads get a
    /// fresh shard path in the same store, so later edits to either owner's
    /// content never affect the other. If the source store no longer accepts
    /// writes the copy is stored inline instead. Returns the copies, primary
    /// first. On failure every copy made so far is removed again.
    pub fn copy_to_owner(&self, primary: &ContentId, new_owner: ObjectId) -> ContentResult<Vec<Content>> {
        let sources = self.get_all_renditions(primary)?;
        let mut copies: Vec<Content> = Vec::with_capacity(sources.len());
        for source in &sources {
            let mut copy = source.clone();
            copy.id = ContentId::new();
            copy.owner = new_owner;
            copy.created_at = chrono::Utc::now();
            copy.rendition_parent = match source.rendition_parent {
                Some(_) => copies.first().map(|p| p.id),
                None => None,
            };
            match self.insert_copy(source, copy) {
                Ok(stored) => copies.push(stored),
                Err(e) => {
                    self.discard_copies(&copies);
                    return Err(e);
                }
            }
        }
        debug!(primary = %primary, owner = %new_owner, copies = copies.len(), "copied content to new owner");
        Ok(copies)
    }

    // ---------------------------------------------------------------
    // Indexing contract
    // ---------------------------------------------------------------

    pub fn set_indexable(&self, id: &ContentId, indexable: bool) -> ContentResult<Content> {
        let mut content = self.find_by_id(id)?;
        content.is_indexable = indexable;
        self.repo.update(&content)?;
        Ok(content)
    }

    /// Record the hash of the text most recently extracted from a content.
    pub fn set_content_hash(&self, id: &ContentId, hash: Option<String>) -> ContentResult<Content> {
        let mut content = self.find_by_id(id)?;
        content.content_hash = hash;
        self.repo.update(&content)?;
        Ok(content)
    }

    /// Whether derived artifacts must be regenerated for freshly extracted
    /// `text`: true unless the stored hash matches.
    pub fn needs_regeneration(&self, id: &ContentId, text: &str) -> ContentResult<bool> {
        let content = self.find_by_id(id)?;
        Ok(match content.content_hash {
            Some(stored) => !TextHasher::EXTRACTED_TEXT.verify(text, &stored),
            None => true,
        })
    }

    /// Contents of `owner` that the indexing pipeline may read.
    pub fn indexable_contents(&self, owner: &ObjectId) -> ContentResult<Vec<Content>> {
        Ok(self
            .repo
            .find_by_owner(owner)?
            .into_iter()
            .filter(|c| c.is_indexable)
            .collect())
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn find_primary(&self, id: &ContentId) -> ContentResult<Content> {
        let content = self.find_by_id(id)?;
        if content.is_secondary() {
            return Err(ContentError::NotPrimary(*id));
        }
        Ok(content)
    }

    fn rendition_target(&self, id: &ContentId) -> ContentResult<Content> {
        let content = self.find_by_id(id)?;
        if content.is_secondary() || !content.is_primary {
            return Err(ContentError::NestedRendition { target: *id });
        }
        Ok(content)
    }

    fn read_payload(&self, content: &Content) -> ContentResult<Vec<u8>> {
        match &content.payload {
            Payload::Inline { data } => Ok(data.clone()),
            Payload::External {
                file_store,
                shard_path,
            } => {
                let full = self.registry.resolve_path(file_store, shard_path)?;
                fs::read(&full).map_err(|source| ContentError::StorageIo {
                    content: content.id,
                    path: shard_path.to_string(),
                    source,
                })
            }
        }
    }

    /// Allocate a shard path in `store` and durably write `bytes` there.
    fn write_new_file(
        &self,
        store: &FileStore,
        content: ContentId,
        filename: &str,
        bytes: &[u8],
    ) -> ContentResult<Payload> {
        let shard_path = self.allocator.allocate(filename);
        write_durably(store, content, &shard_path, bytes)?;
        Ok(Payload::External {
            file_store: store.id,
            shard_path,
        })
    }

    /// Write `bytes` for `content` into `store`, then insert the row. The
    /// file is removed again if the insert fails.
    fn write_and_insert(&self, store: &FileStore, mut content: Content, bytes: &[u8]) -> ContentResult<Content> {
        content.payload = self.write_new_file(store, content.id, &content.name, bytes)?;
        let payload = content.payload.clone();
        self.repo.insert(content).inspect_err(|_| discard_file(store, &payload))
    }

    /// Give `copy` its own bytes and insert it. Leaves nothing behind on
    /// failure.
    fn insert_copy(&self, source: &Content, mut copy: Content) -> ContentResult<Content> {
        let Payload::External { file_store, .. } = &source.payload else {
            // Inline bytes were cloned along with the row.
            return self.repo.insert(copy);
        };
        let data = self.read_payload(source)?;
        if let Err(e) = self.registry.require_active(file_store) {
            warn!(content = %source.id, error = %e, "source store not writable; copying inline");
            copy.payload = Payload::Inline { data };
            return self.repo.insert(copy);
        }
        self.registry
            .with_active(file_store, |store| self.write_and_insert(store, copy, &data))
    }

    fn discard_copies(&self, copies: &[Content]) {
        if let Err(e) = self.delete_rows_and_files(copies) {
            warn!(error = %e, "failed to roll back partial content copy");
        }
    }

    /// Remove rows first, then the files they pointed at.
    ///
    /// Every file is attempted even after a failure; the first error is
    /// returned once the rows are gone and the walk is done.
    fn delete_rows_and_files(&self, doomed: &[Content]) -> ContentResult<usize> {
        if doomed.is_empty() {
            return Ok(0);
        }
        let ids: Vec<ContentId> = doomed.iter().map(|c| c.id).collect();
        let removed = self.repo.delete_many(&ids)?;

        let mut first_error = None;
        for content in doomed {
            let Some((store_id, shard_path)) = content.payload.external() else {
                continue;
            };
            let cleaned = self
                .registry
                .find_by_id(store_id)
                .map_err(ContentError::from)
                .and_then(|store| {
                    cleanup_after_delete(store.root(), shard_path).map_err(ContentError::from)
                });
            if let Err(e) = cleaned {
                warn!(content = %content.id, path = %shard_path, error = %e, "file left behind after delete");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(removed),
        }
    }
}

fn validate_name(name: &str) -> ContentResult<()> {
    if name.trim().is_empty() {
        return Err(ContentError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn secondary_of(
    primary: &Content,
    name: &str,
    mime_type: &str,
    is_indexable: bool,
    payload: Payload,
    size: u64,
) -> Content {
    let mut rendition = Content::primary(
        name.to_string(),
        mime_type.to_string(),
        primary.owner,
        payload,
        size,
    );
    rendition.is_primary = false;
    rendition.is_indexable = is_indexable;
    rendition.rendition_parent = Some(primary.id);
    rendition
}

/// Write `bytes` to `shard_path` under `store`: temp file in the target
/// directory, `fsync`, then atomic rename into place.
fn write_durably(
    store: &FileStore,
    content: ContentId,
    shard_path: &ShardPath,
    bytes: &[u8],
) -> ContentResult<()> {
    let io_err = |source: std::io::Error| ContentError::StorageIo {
        content,
        path: shard_path.to_string(),
        source,
    };

    let full = store.resolve(shard_path);
    let dir = full.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = match temp_file_in(dir) {
        // A concurrent cleanup pruned the fresh shard directory; recreate it once.
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %shard_path, "shard directory vanished before write; retrying");
            temp_file_in(dir)
        }
        other => other,
    }
    .map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(&full).map_err(|e| io_err(e.error))?;

    debug!(content = %content, path = %shard_path, size = bytes.len(), "wrote external bytes");
    Ok(())
}

fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    fs::create_dir_all(dir)?;
    tempfile::Builder::new().prefix(".arca-write-").tempfile_in(dir)
}

/// Best-effort removal of a file whose metadata never got committed.
fn discard_file(store: &FileStore, payload: &Payload) {
    if let Some((_, shard_path)) = payload.external() {
        if let Err(e) = cleanup_after_delete(store.root(), shard_path) {
            warn!(path = %shard_path, error = %e, "failed to discard uncommitted file");
        }
    }
}
