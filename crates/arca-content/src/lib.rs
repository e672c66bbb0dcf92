//! Content and rendition storage for Arca.
//!
//! A [`Content`] row holds one binary payload of a versioned object. Its
//! bytes live in exactly one of two places:
//!
//! - **inline** in the metadata row, or
//! - **external**, in a file under a registered file store at a hex-sharded
//!   path.
//!
//! Contents form a flat two-level hierarchy. A *primary* content is the
//! canonical payload; *secondary renditions* (extracted text, thumbnails, ...)
//! hang off a primary and may not have renditions of their own.
//!
//! # Design Rules
//!
//! - External bytes are written and synced **before** the metadata row that
//!   points at them is committed.
//! - Replacing a primary's bytes drops its secondaries, since they were
//!   derived from the old bytes.
//! - Deleting a primary deletes its secondaries first.
//!
//! # Modules
//!
//! - [`model`]: [`Content`], [`Payload`], [`Upload`], [`StorageTarget`]
//! - [`traits`]: [`ContentRepository`] persistence seam
//! - [`memory`]: [`InMemoryContentRepository`]
//! - [`store`]: [`ContentStore`], the public operations
//! - [`hash`]: extracted-text hashing for change detection

pub mod error;
pub mod hash;
pub mod memory;
pub mod model;
pub mod store;
pub mod traits;

pub use error::{ContentError, ContentResult};
pub use hash::TextHasher;
pub use memory::InMemoryContentRepository;
pub use model::{Content, Payload, StorageTarget, Upload};
pub use store::ContentStore;
pub use traits::ContentRepository;
