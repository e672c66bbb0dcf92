//! On-disk metadata catalog.
//!
//! The whole catalog is one JSON document. Saving writes a temp file next to
//! the target, syncs it, and renames it into place, so a crash leaves either
//! the old catalog or the new one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use arca_content::Content;
use arca_filestore::FileStore;
use arca_lifecycle::{Document, Folder, Report, User};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SdkError, SdkResult};

/// Current catalog layout.
pub const CATALOG_FORMAT: u32 = 1;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub format: u32,
    #[serde(default)]
    pub file_stores: Vec<FileStore>,
    #[serde(default)]
    pub contents: Vec<Content>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            format: CATALOG_FORMAT,
            ..Self::default()
        }
    }

    /// Read a catalog. A missing file is an empty catalog.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::empty()),
            Err(source) => {
                return Err(SdkError::CatalogIo {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let catalog: Self = serde_json::from_slice(&bytes).map_err(|e| SdkError::CatalogFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if catalog.format != CATALOG_FORMAT {
            return Err(SdkError::CatalogFormat {
                path: path.to_path_buf(),
                reason: format!("unsupported format {}", catalog.format),
            });
        }
        debug!(
            path = %path.display(),
            stores = catalog.file_stores.len(),
            contents = catalog.contents.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Atomically replace the catalog at `path`.
    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let io_err = |source: std::io::Error| SdkError::CatalogIo {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => dir,
            None => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let json = serde_json::to_vec_pretty(self).map_err(|e| SdkError::CatalogFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".catalog-")
            .tempfile_in(dir)
            .map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        debug!(path = %path.display(), bytes = json.len(), "saved catalog");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_catalog_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let c = Catalog::load(&dir.path().join("catalog.json")).unwrap();
        assert_eq!(c.format, CATALOG_FORMAT);
        assert!(c.contents.is_empty());
    }

    #[test]
    fn save_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta/catalog.json");
        let mut c = Catalog::empty();
        c.documents.push(Document::new("spec"));
        c.save(&path).unwrap();
        c.folders.push(Folder::new("root", "/"));
        c.save(&path).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.documents.len(), 1);
        assert_eq!(loaded.folders.len(), 1);
        let leftovers = fs::read_dir(dir.path().join("meta")).unwrap().count();
        assert_eq!(leftovers, 1, "no temp files left behind");
    }

    #[test]
    fn rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"{"format": 99}"#).unwrap();
        assert!(matches!(Catalog::load(&path), Err(SdkError::CatalogFormat { .. })));
    }

    #[test]
    fn rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(Catalog::load(&path), Err(SdkError::CatalogFormat { .. })));
    }
}
