//! Foundation types for Arca.
//!
//! This crate provides the identifier, version, and storage types shared by
//! every other Arca crate.
//!
//! # Key Types
//!
//! - [`ObjectId`]: identity of a versioned object (document, folder, user, ...)
//! - [`ContentId`]: identity of a content row (primary or rendition)
//! - [`FileStoreId`]: identity of an external storage root
//! - [`OwnerId`]: the user a versioned object is attributed to
//! - [`Version`]: a `major.minor` version number
//! - [`StorageLocation`] / [`FileStoreStatus`]: storage state enums
//! - [`ErrorClass`]: the four-way error taxonomy surfaced at API boundaries

pub mod bytes;
pub mod error;
pub mod ids;
pub mod storage;
pub mod version;

pub use error::{ErrorClass, TypeError};
pub use ids::{ContentId, FileStoreId, ObjectId, OwnerId};
pub use storage::{FileStoreStatus, StorageLocation};
pub use version::Version;
