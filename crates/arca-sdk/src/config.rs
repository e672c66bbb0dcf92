use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Runtime configuration, read from `arca.toml`.
///
/// Every field has a default, so a partial file (or none at all) is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcaConfig {
    /// Where the metadata catalog is persisted.
    pub catalog_path: PathBuf,
    /// File store that receives content above `inline_threshold`. When unset
    /// all content is stored inline unless a target is given explicitly.
    pub default_file_store: Option<String>,
    /// Largest payload, in bytes, stored inline by default.
    pub inline_threshold: u64,
    /// Check free space before writing to a file store. Advisory only: the
    /// check and the write are not atomic.
    pub check_space: bool,
}

impl Default for ArcaConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(".arca/catalog.json"),
            default_file_store: None,
            inline_threshold: 1024 * 1024,
            check_space: true,
        }
    }
}

impl ArcaConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(SdkError::Config {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };
        toml::from_str(&text).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let config_err = |reason: String| SdkError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let text = toml::to_string_pretty(self).map_err(|e| config_err(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| config_err(e.to_string()))?;
        }
        fs::write(path, text).map_err(|e| config_err(e.to_string()))
    }
}
