//! Manifest types for pack artifacts.
//!
//! A manifest describes one built archive: its version, asset name, content
//! hash and the pre-expansion selection entries an apply must touch. Entries
//! are coarse intent (directories stay directories); the archive holds the
//! expanded per-file ground truth, and apply reconciles the two by copying
//! whatever the archive actually contains under each entry.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::errors::Result;

/// File name the manifest is published under.
pub const MANIFEST_NAME: &str = "manifest.json";

/// File name the archive is published under.
pub const ARCHIVE_NAME: &str = "minecraft-pack.zip";

/// Pack manifest — serialized as `manifest.json` next to the archive and as a
/// release asset. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub asset: String,
    pub sha256: String,
    pub paths: Vec<PackEntry>,
}

/// One root-relative target an apply must replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackEntry {
    pub path: String,
    pub mode: ReplaceMode,
}

/// How an entry is applied. Every pack today is a full replace per path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplaceMode {
    #[serde(rename = "replace")]
    Replace,
}

impl Manifest {
    /// Timestamp-derived fallback version, minute granularity.
    pub fn timestamp_version() -> String {
        chrono::Local::now().format("%Y.%m.%d.%H%M").to_string()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
