//! Serde helper that encodes byte payloads as hex strings.
//!
//! Inline content payloads end up in the JSON catalog; a hex string is far
//! more compact there than serde's default array-of-numbers encoding.
//!
//! ```
//! #[derive(serde::Serialize, serde::Deserialize)]
//! struct Row {
//!     #[serde(with = "arca_types::bytes::hex_bytes")]
//!     data: Vec<u8>,
//! }
//! ```

pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        #[serde(with = "super::hex_bytes")]
        data: Vec<u8>,
    }

    #[test]
    fn encodes_as_hex() {
        let row = Row { data: vec![0xde, 0xad] };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"data":"dead"}"#);
        assert_eq!(serde_json::from_str::<Row>(&json).unwrap(), row);
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(serde_json::from_str::<Row>(r#"{"data":"zz"}"#).is_err());
    }
}
