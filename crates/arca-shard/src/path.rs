use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShardError;

/// Number of nested shard directories above every leaf file.
pub const SHARD_DEPTH: usize = 4;

/// Length of the hex identifier that names every leaf file.
pub(crate) const ID_HEX_LEN: usize = 32;

/// A store-relative path of the form `aa/bb/cc/dd/<id>[.ext]`.
///
/// Always uses `/` as separator regardless of platform so that persisted
/// metadata is portable. Join it onto a store root with
/// [`ShardPath::under`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShardPath(String);

impl ShardPath {
    /// Build a shard path from a 32-character lower-case hex identifier and
    /// an optional extension. Callers must pass a valid identifier.
    pub(crate) fn from_parts(id: &str, ext: Option<&str>) -> Self {
        let mut s = String::with_capacity(ID_HEX_LEN + SHARD_DEPTH * 3 + 8);
        for level in 0..SHARD_DEPTH {
            s.push_str(&id[level * 2..level * 2 + 2]);
            s.push('/');
        }
        s.push_str(id);
        if let Some(ext) = ext {
            s.push('.');
            s.push_str(ext);
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The leaf file name (`<id>[.ext]`).
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The 32-character hex identifier embedded in the leaf name.
    pub fn id(&self) -> &str {
        let name = self.file_name();
        &name[..ID_HEX_LEN.min(name.len())]
    }

    /// The four shard directory names, outermost first.
    pub fn shards(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').take(SHARD_DEPTH)
    }

    /// Absolute location of this path under `root`.
    pub fn under(&self, root: &Path) -> PathBuf {
        let mut full = root.to_path_buf();
        for component in self.0.split('/') {
            full.push(component);
        }
        full
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl FromStr for ShardPath {
    type Err = ShardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ShardError::Malformed {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != SHARD_DEPTH + 1 {
            return Err(malformed("expected four shard directories and a file name"));
        }
        let leaf = parts[SHARD_DEPTH];
        match leaf.get(..ID_HEX_LEN) {
            Some(id) if is_lower_hex(id) => {}
            _ => return Err(malformed("file name must start with a 32-character hex id")),
        }
        let rest = &leaf[ID_HEX_LEN..];
        if !(rest.is_empty() || (rest.starts_with('.') && rest.len() > 1)) {
            return Err(malformed("unexpected characters after the id"));
        }
        for (level, shard) in parts[..SHARD_DEPTH].iter().enumerate() {
            if *shard != &leaf[level * 2..level * 2 + 2] {
                return Err(malformed("shard directories do not match the id prefix"));
            }
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ShardPath {
    type Error = ShardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ShardPath> for String {
    fn from(path: ShardPath) -> Self {
        path.0
    }
}

impl fmt::Debug for ShardPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShardPath({})", self.0)
    }
}

impl fmt::Display for ShardPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
