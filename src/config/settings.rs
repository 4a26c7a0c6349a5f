//! Optional user settings file (`$XDG_CONFIG_HOME/dotman/config.toml`).
use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default branch used when initializing a new store.
pub const DEFAULT_BRANCH: &str = "main";

/// Settings loaded from `config.toml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Store directory; `~` is expanded against the home directory.
    pub store_dir: Option<String>,
    /// Branch created by `init`.
    pub default_branch: String,
    /// Extra top-level store names excluded from deploy and discovery.
    pub ignore: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: None,
            default_branch: DEFAULT_BRANCH.to_string(),
            ignore: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML settings: {}", path.display()))
    }
}

/// Location of the settings file given `$XDG_CONFIG_HOME` (if set) and the
/// home directory.
#[must_use]
pub fn default_path(xdg_config_home: Option<&str>, home: &Path) -> PathBuf {
    let base = match xdg_config_home {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home.join(".config"),
    };
    base.join("dotman").join("config.toml")
}
