//! File store registry for Arca.
//!
//! A file store is a named directory on a local filesystem that external
//! content is written into. Stores are registered, activated, and
//! deactivated independently of the content they hold:
//!
//! - only an **active** store accepts new writes,
//! - deactivating a store never touches existing files,
//! - a store can only be deleted once no content row references it.
//!
//! # Modules
//!
//! - [`model`]: the [`FileStore`] row
//! - [`traits`]: [`FileStoreRepository`] persistence seam and the
//!   [`ContentReferences`] count query used to block deletion
//! - [`memory`]: [`InMemoryFileStoreRepository`]
//! - [`registry`]: [`FileStoreRegistry`], the public operations
//! - [`space`]: filesystem capacity queries

pub mod error;
pub mod memory;
pub mod model;
pub mod registry;
pub mod space;
pub mod traits;

pub use error::{FileStoreError, FileStoreResult};
pub use memory::InMemoryFileStoreRepository;
pub use model::FileStore;
pub use registry::FileStoreRegistry;
pub use traits::{ContentReferences, FileStoreRepository};
