use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid version string: {0}")]
    InvalidVersion(String),
}

/// Coarse classification of every Arca error.
///
/// Each crate's error enum maps onto one of these so that an API boundary can
/// pick a status code without matching on crate-specific variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Unknown id or name (404-equivalent).
    NotFound,
    /// Operation not allowed in the current state (400/409-equivalent).
    InvalidState,
    /// Filesystem unreadable, unwritable, or full (500-equivalent).
    StorageIo,
    /// Input rejected before any state change.
    Validation,
}

impl ErrorClass {
    /// HTTP-style status code an API boundary should use for this class.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidState => 409,
            Self::StorageIo => 500,
            Self::Validation => 400,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not-found",
            Self::InvalidState => "invalid-state",
            Self::StorageIo => "storage-io",
            Self::Validation => "validation",
        };
        f.write_str(label)
    }
}
