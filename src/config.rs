//! Settings persistence for minepack.
//!
//! Settings live in `settings.json` under the platform-local data directory.
//! Missing keys backfill from defaults on load; unknown keys from older
//! versions are ignored. The struct is an explicit value passed into build and
//! apply calls — there is no ambient global settings state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::errors::{PackError, Result};

/// Directory name under the platform data dir holding settings.json.
const APP_DIR: &str = "minepack";

/// Selection checked by default when building a pack.
pub const DEFAULT_INCLUDE: &[&str] = &[
    "config",
    "journeymap",
    "libraries",
    "mods",
    "resourcepacks",
    "shaderpacks",
    "options.txt",
    "optionsof.txt",
    "optionsshaders.txt",
    "servers.dat",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Owner of the GitHub repository holding pack releases
    #[serde(default)]
    pub repo_owner: String,

    /// Name of the GitHub repository holding pack releases
    #[serde(default)]
    pub repo_name: String,

    /// Root of the live Minecraft installation
    #[serde(default = "default_minecraft_path")]
    pub minecraft_path: PathBuf,

    /// When set, apply narrates every step but mutates nothing
    #[serde(default)]
    pub dry_run: bool,

    /// Number of backup snapshots retained after pruning
    #[serde(default = "default_keep_backups")]
    pub keep_backups: usize,

    /// Version string of the most recently applied pack
    #[serde(default)]
    pub last_applied_version: String,

    /// Check for and apply the latest pack on front-end start
    #[serde(default)]
    pub auto_update: bool,

    /// Persisted selection for pack builds
    #[serde(default = "default_include_selected")]
    pub include_selected: Vec<String>,

    /// Backing file, set on load; absent for in-memory values
    #[serde(skip)]
    path: Option<PathBuf>,
}

fn default_minecraft_path() -> PathBuf {
    // %APPDATA%\.minecraft on Windows; best effort elsewhere
    std::env::var_os("APPDATA")
        .map(|appdata| PathBuf::from(appdata).join(".minecraft"))
        .or_else(|| dirs::config_dir().map(|d| d.join(".minecraft")))
        .unwrap_or_default()
}

fn default_keep_backups() -> usize {
    3
}

fn default_include_selected() -> Vec<String> {
    DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            repo_owner: String::new(),
            repo_name: String::new(),
            minecraft_path: default_minecraft_path(),
            dry_run: false,
            keep_backups: default_keep_backups(),
            last_applied_version: String::new(),
            auto_update: false,
            include_selected: default_include_selected(),
            path: None,
        }
    }
}

impl Settings {
    /// Load settings from the platform-default location, creating the file
    /// with defaults when it does not exist yet.
    pub fn load_default() -> Result<Self> {
        let dir = dirs::data_local_dir()
            .ok_or_else(|| PackError::Config("no platform data directory".to_string()))?
            .join(APP_DIR);
        std::fs::create_dir_all(&dir)?;
        Self::load_from(&dir.join("settings.json"))
    }

    /// Load settings from an explicit file, creating it with defaults when
    /// missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut settings = Settings::default();
            settings.path = Some(path.to_path_buf());
            settings.save()?;
            return Ok(settings);
        }

        let content = std::fs::read_to_string(path)?;
        let mut settings: Settings = serde_json::from_str(&content)?;
        settings.path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Persist settings back to the file they were loaded from.
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| PackError::Config("settings have no backing file".to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Absolute path of the backing settings file, if any.
    pub fn store_location(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
