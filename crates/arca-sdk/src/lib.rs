//! High-level Arca API.
//!
//! [`Arca`] wires the lifecycle managers, the content store, and the file
//! store registry into one handle and keeps them consistent:
//!
//! - deleting an object deletes the content it owns,
//! - branching a version copies the source's content to the new version,
//! - [`Arca::flush`] persists everything to a single JSON [`Catalog`].
//!
//! ```no_run
//! use arca_sdk::{Arca, ArcaConfig, Document, Upload};
//!
//! let arca = Arca::open(ArcaConfig::default())?;
//! let upload = Upload::new("plan.txt", "text/plain", b"draft".to_vec());
//! let (doc, _) = arca.create(Document::new("plan"), Some(upload))?;
//! let next: Document = arca.create_major_version(&doc.header.id)?;
//! arca.flush()?;
//! # Ok::<(), arca_sdk::SdkError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod repository;

pub use catalog::Catalog;
pub use config::ArcaConfig;
pub use error::{SdkError, SdkResult};
pub use repository::{Arca, ManagedKind};

pub use arca_content::{Content, StorageTarget, Upload};
pub use arca_filestore::FileStore;
pub use arca_lifecycle::{Document, Folder, ObjectSummary, Report, User, Versioned};
pub use arca_types::{ContentId, ErrorClass, FileStoreId, ObjectId, OwnerId, Version};
