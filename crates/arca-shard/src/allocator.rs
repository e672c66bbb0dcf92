use std::path::Path;

use rand::RngCore;
use tracing::trace;

use crate::path::ShardPath;

/// Longest extension carried over from the original file name.
const MAX_EXTENSION_LEN: usize = 16;

/// Mints fresh [`ShardPath`]s.
///
/// The allocator is stateless: uniqueness comes from 128 bits of randomness,
/// not from checking the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShardAllocator;

impl ShardAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Allocate a fresh path for a file originally called `original_filename`.
    ///
    /// The extension is kept (lower-cased) when it is short and purely
    /// alphanumeric; anything else is dropped so that user-supplied names can
    /// never influence the directory layout.
    pub fn allocate(&self, original_filename: &str) -> ShardPath {
        let mut raw = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut raw);
        let id = hex::encode(raw);
        let ext = sanitized_extension(original_filename);
        let path = ShardPath::from_parts(&id, ext.as_deref());
        trace!(path = %path, "allocated shard path");
        path
    }
}

fn sanitized_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn matches_layout(s: &str) -> bool {
        let parts: Vec<&str> = s.split('/').collect();
        parts.len() == 5
            && parts[..4].iter().all(|p| {
                p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
            })
            && !parts[4].is_empty()
    }

    #[test]
    fn keeps_extension() {
        let p = ShardAllocator::new().allocate("report.PDF");
        assert!(p.as_str().ends_with(".pdf"));
        assert_eq!(p.file_name(), format!("{}.pdf", p.id()));
    }

    #[test]
    fn no_extension() {
        let p = ShardAllocator::new().allocate("Makefile");
        assert_eq!(p.file_name(), p.id());
    }

    #[test]
    fn hostile_extensions_are_dropped() {
        let alloc = ShardAllocator::new();
        assert_eq!(alloc.allocate("x.t@r").file_name().len(), 32);
        assert_eq!(alloc.allocate("x.averyveryverylongextension").file_name().len(), 32);
        assert_eq!(alloc.allocate("archive.").file_name().len(), 32);
    }

    #[test]
    fn shards_are_prefixes_of_the_id() {
        let p = ShardAllocator::new().allocate("a.txt");
        let joined: String = p.shards().collect();
        assert!(p.id().starts_with(&joined));
    }

    #[test]
    fn ten_thousand_paths_are_well_formed_and_distinct() {
        let alloc = ShardAllocator::new();
        let mut seen = HashSet::new();
        for i in 0..10_000 {
            let p = alloc.allocate(&format!("file-{i}.bin"));
            assert!(matches_layout(p.as_str()), "bad layout: {p}");
            assert!(seen.insert(p), "duplicate shard path");
        }
        assert_eq!(seen.len(), 10_000);
    }

    #[test]
    fn allocated_paths_reparse() {
        let p = ShardAllocator::new().allocate("notes.md");
        let back: ShardPath = p.as_str().parse().unwrap();
        assert_eq!(back, p);
    }

    proptest::proptest! {
        #[test]
        fn any_filename_yields_valid_path(name in ".{0,64}") {
            let p = ShardAllocator::new().allocate(&name);
            proptest::prop_assert!(matches_layout(p.as_str()));
            proptest::prop_assert!(p.as_str().parse::<ShardPath>().is_ok());
        }
    }
}
