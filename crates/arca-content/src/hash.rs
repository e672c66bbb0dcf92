/// Domain-separated BLAKE3 hasher for extracted text.
///
/// Content rows store the hash of the text last extracted from them. An
/// indexer re-extracts, hashes, and compares; an equal hash means derived
/// artifacts (renditions, embeddings) are still current.
pub struct TextHasher {
    domain: &'static str,
}

impl TextHasher {
    /// Hasher for text extracted from content bytes.
    pub const EXTRACTED_TEXT: Self = Self {
        domain: "arca-extracted-text-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hex-encoded hash of `text`.
    pub fn hash(&self, text: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(text.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    pub fn verify(&self, text: &str, expected: &str) -> bool {
        self.hash(text) == expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let h = TextHasher::EXTRACTED_TEXT;
        assert_eq!(h.hash("hello"), h.hash("hello"));
        assert_eq!(h.hash("hello").len(), 64);
    }

    #[test]
    fn domains_separate() {
        let other = TextHasher::new("other-v1");
        assert_ne!(TextHasher::EXTRACTED_TEXT.hash("x"), other.hash("x"));
    }

    #[test]
    fn verify_detects_change() {
        let h = TextHasher::EXTRACTED_TEXT;
        let stored = h.hash("version one");
        assert!(h.verify("version one", &stored));
        assert!(!h.verify("version two", &stored));
    }
}
