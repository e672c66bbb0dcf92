//! Opaque row identifiers.
//!
//! All identifiers are UUID v7 values so that freshly minted ids sort roughly
//! by creation time. Each kind of row gets its own newtype; a [`ContentId`]
//! can never be passed where an [`ObjectId`] is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new time-ordered identifier (UUID v7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Short representation (first 8 characters of the UUID).
            pub fn short_id(&self) -> String {
                self.0.to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| TypeError::InvalidId(format!("{}: {e}", $label)))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identity of a versioned object row (any kind).
    ObjectId,
    "object id"
);

define_id!(
    /// Identity of a content row.
    ContentId,
    "content id"
);

define_id!(
    /// Identity of a registered file store.
    FileStoreId,
    "file store id"
);

define_id!(
    /// Identity of the user an object is attributed to.
    OwnerId,
    "owner id"
);

impl From<ObjectId> for OwnerId {
    /// Users are themselves versioned objects; their object id doubles as the
    /// owner reference for everything they create.
    fn from(id: ObjectId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(ObjectId::new(), ObjectId::new());
        assert_ne!(ContentId::new(), ContentId::new());
    }

    #[test]
    fn parse_roundtrip() {
        let id = FileStoreId::new();
        let parsed: FileStoreId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<ContentId>().unwrap_err();
        assert!(matches!(err, TypeError::InvalidId(_)));
    }

    #[test]
    fn short_id_is_eight_chars() {
        assert_eq!(OwnerId::new().short_id().len(), 8);
    }

    #[test]
    fn serde_is_transparent() {
        let id = ObjectId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn user_object_id_converts_to_owner() {
        let user = ObjectId::new();
        let owner = OwnerId::from(user);
        assert_eq!(owner.as_uuid(), user.as_uuid());
    }
}
