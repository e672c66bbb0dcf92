//! Hex-sharded path allocation for Arca file stores.
//!
//! Every externally stored payload gets a fresh 128-bit random identifier.
//! The first four byte pairs of its hex rendering become four nested
//! directories, and the full identifier (plus the original extension) becomes
//! the file name:
//!
//! ```text
//! 3f/a9/0c/7e/3fa90c7e5d1b42c8a6e09f1d2b3c4a5e.pdf
//! ```
//!
//! Each shard level has at most 256 children, so a store holding millions of
//! files never produces a huge directory listing.
//!
//! # Modules
//!
//! - [`path`]: the validated [`ShardPath`] newtype
//! - [`allocator`]: [`ShardAllocator`] minting fresh paths
//! - [`cleanup`]: [`cleanup_after_delete`] pruning empty shard directories
//! - [`error`]: [`ShardError`]

pub mod allocator;
pub mod cleanup;
pub mod error;
pub mod path;

pub use allocator::ShardAllocator;
pub use cleanup::{cleanup_after_delete, CleanupReport};
pub use error::{ShardError, ShardResult};
pub use path::{ShardPath, SHARD_DEPTH};
