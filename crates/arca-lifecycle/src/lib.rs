//! Versioned object lifecycle for Arca.
//!
//! Objects of every kind (documents, folders, users, reports) share one
//! generic engine, [`LifecycleManager`]. A kind plugs in by embedding a
//! [`VersionHeader`] and implementing [`Versioned`].
//!
//! # Versioning Rules
//!
//! - A new object is saved as `1.0`.
//! - A major version is `max(major over all versions of the name) + 1 . 0`.
//! - A minor version is `major . max(minor under that major) + 1`.
//! - A new version points at its source through `parent_version`. The
//!   reference is weak: deleting a version never deletes its parent or its
//!   children.
//! - A version is *latest* when no other version points at it.
//!
//! # Modules
//!
//! - [`header`]: [`VersionHeader`] and the [`Versioned`] trait
//! - [`traits`]: [`ObjectRepository`] persistence seam
//! - [`memory`]: [`InMemoryObjectRepository`]
//! - [`manager`]: [`LifecycleManager`]
//! - [`locks`]: per-name [`LineageLocks`]
//! - [`kinds`]: built-in kinds
//! - [`capability`]: [`KindRegistry`] for dispatch by kind id

pub mod capability;
pub mod error;
pub mod header;
pub mod kinds;
pub mod locks;
pub mod manager;
pub mod memory;
pub mod traits;

pub use capability::{KindCapabilities, KindRegistry, ObjectSummary};
pub use error::{LifecycleError, LifecycleResult};
pub use header::{VersionHeader, Versioned};
pub use kinds::{Document, Folder, Report, ReportFormat, User};
pub use locks::LineageLocks;
pub use manager::LifecycleManager;
pub use memory::InMemoryObjectRepository;
pub use traits::ObjectRepository;
