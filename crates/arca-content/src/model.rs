use std::io::{self, Read};

use arca_shard::ShardPath;
use arca_types::bytes::hex_bytes;
use arca_types::{ContentId, FileStoreId, ObjectId, StorageLocation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a content's bytes live.
///
/// The two backends are mutually exclusive by construction: a row either
/// carries inline bytes or an external pointer, never both.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "location", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Payload {
    Inline {
        #[serde(with = "hex_bytes")]
        data: Vec<u8>,
    },
    External {
        file_store: FileStoreId,
        shard_path: ShardPath,
    },
}

impl Payload {
    pub fn location(&self) -> StorageLocation {
        match self {
            Self::Inline { .. } => StorageLocation::Inline,
            Self::External { .. } => StorageLocation::External,
        }
    }

    /// The store and shard path, if external.
    pub fn external(&self) -> Option<(&FileStoreId, &ShardPath)> {
        match self {
            Self::External {
                file_store,
                shard_path,
            } => Some((file_store, shard_path)),
            Self::Inline { .. } => None,
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline { data } => f
                .debug_struct("Inline")
                .field("len", &data.len())
                .finish(),
            Self::External {
                file_store,
                shard_path,
            } => f
                .debug_struct("External")
                .field("file_store", file_store)
                .field("shard_path", shard_path)
                .finish(),
        }
    }
}

/// One binary payload attached to a versioned object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    pub name: String,
    /// Declared MIME type, as supplied by the uploader.
    pub mime_type: String,
    /// The versioned object this content belongs to. Deleting the object
    /// deletes the content.
    pub owner: ObjectId,
    pub payload: Payload,
    pub is_primary: bool,
    /// Whether the indexing pipeline may read this content.
    pub is_indexable: bool,
    /// Hash of the text last extracted from this content.
    pub content_hash: Option<String>,
    /// The primary this rendition derives from; `None` for primaries.
    pub rendition_parent: Option<ContentId>,
    /// Payload size in bytes.
    pub size: u64,
    /// Creation order, assigned by the repository on insert.
    pub seq: u64,
    pub created_at: DateTime<Utc>,
}

impl Content {
    /// A primary content row; `seq` is filled in on insert.
    pub(crate) fn primary(
        name: String,
        mime_type: String,
        owner: ObjectId,
        payload: Payload,
        size: u64,
    ) -> Self {
        Self {
            id: ContentId::new(),
            name,
            mime_type,
            owner,
            payload,
            is_primary: true,
            is_indexable: true,
            content_hash: None,
            rendition_parent: None,
            size,
            seq: 0,
            created_at: Utc::now(),
        }
    }

    pub fn location(&self) -> StorageLocation {
        self.payload.location()
    }

    pub fn is_secondary(&self) -> bool {
        self.rendition_parent.is_some()
    }
}

/// Where newly created content should be stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageTarget {
    Inline,
    FileStore(FileStoreId),
}

/// An uploaded file as handed over by the API layer.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Drain a byte source into an upload.
    pub fn from_reader(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        mut source: impl Read,
    ) -> io::Result<Self> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        Ok(Self::new(filename, mime_type, data))
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}
