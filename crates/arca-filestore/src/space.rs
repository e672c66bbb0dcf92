//! Filesystem capacity queries.
//!
//! Values are point-in-time and advisory: another writer may consume the
//! space between a check and the write that relies on it.

use std::io;
use std::path::Path;

/// Bytes available to unprivileged writers on the filesystem holding `path`.
#[cfg(unix)]
pub fn available_space(path: &Path) -> io::Result<u64> {
    let stat = nix::sys::statvfs::statvfs(path).map_err(io::Error::from)?;
    #[allow(clippy::unnecessary_cast)]
    let available = stat.blocks_available() as u64 * stat.fragment_size() as u64;
    Ok(available)
}

#[cfg(not(unix))]
pub fn available_space(_path: &Path) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "capacity queries are only implemented for unix filesystems",
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_has_space() {
        let dir = tempfile::tempdir().unwrap();
        assert!(available_space(dir.path()).unwrap() > 0);
    }

    #[test]
    fn missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = available_space(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
