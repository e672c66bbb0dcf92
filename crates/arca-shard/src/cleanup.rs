use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ShardError, ShardResult};
use crate::path::{ShardPath, SHARD_DEPTH};

/// What [`cleanup_after_delete`] actually removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Whether the leaf file existed and was removed.
    pub file_removed: bool,
    /// Number of shard directories removed (0..=4).
    pub dirs_removed: usize,
}

/// Delete the file at `shard_path` under `root`, then prune its shard
/// directories bottom-up while they are empty.
///
/// Pruning stops at the first ancestor that still has entries. Directory
/// removal uses `remove_dir`, which refuses non-empty directories, so a
/// concurrent writer that has just created a sibling simply makes the walk
/// stop early. An ancestor that is already gone is skipped. The store root
/// itself is never touched.
///
/// A leaf that is already missing is not an error; any other failure to
/// remove it is.
pub fn cleanup_after_delete(root: &Path, shard_path: &ShardPath) -> ShardResult<CleanupReport> {
    let full = shard_path.under(root);
    let mut report = CleanupReport::default();

    match fs::remove_file(&full) {
        Ok(()) => report.file_removed = true,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %shard_path, "shard file already absent during cleanup");
        }
        Err(source) => {
            return Err(ShardError::Io {
                path: shard_path.to_string(),
                source,
            })
        }
    }

    let mut dir = full.parent();
    for _ in 0..SHARD_DEPTH {
        let Some(current) = dir else { break };
        match fs::remove_dir(current) {
            Ok(()) => report.dirs_removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                debug!(path = %shard_path, error = %e, "shard directory kept");
                break;
            }
        }
        dir = current.parent();
    }

    debug!(
        path = %shard_path,
        file_removed = report.file_removed,
        dirs_removed = report.dirs_removed,
        "shard cleanup finished"
    );
    Ok(report)
}
