//! Resolved configuration: home, store location and user settings.

pub mod paths;
pub mod settings;

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use crate::error::PathError;
use settings::Settings;

/// Name of the default store directory under home.
pub const STORE_DIR_NAME: &str = ".dotman";

/// Name of the manifest file at the store root.
pub const MANIFEST_FILE_NAME: &str = "index.json";

/// Resolved locations and settings for one dotman invocation.
///
/// Built once in `main` and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// The user's home directory (the security boundary).
    pub home: PathBuf,
    /// Root of the managed store.
    pub store_dir: PathBuf,
    /// Path to `index.json` inside the store.
    pub manifest_file: PathBuf,
    /// Branch created by `init`.
    pub default_branch: String,
    /// Extra top-level store names excluded from deploy and discovery.
    pub ignore: Vec<String>,
}

impl Config {
    /// Build a config for `home` and `store_dir` with default settings.
    #[must_use]
    pub fn new(home: impl Into<PathBuf>, store_dir: impl Into<PathBuf>) -> Self {
        let store_dir = store_dir.into();
        Self {
            home: home.into(),
            manifest_file: store_dir.join(MANIFEST_FILE_NAME),
            store_dir,
            default_branch: settings::DEFAULT_BRANCH.to_string(),
            ignore: Vec::new(),
        }
    }

    /// Resolve the config from CLI overrides, the process environment and
    /// the settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// settings file is malformed.
    pub fn resolve(home: Option<&Path>, store: Option<&Path>) -> Result<Self> {
        Self::resolve_with(home, store, |key| std::env::var(key).ok())
    }

    /// Like [`resolve`](Self::resolve) with an explicit environment lookup.
    ///
    /// Precedence: flags, then `DOTMAN_DIR` / `HOME` (`USERPROFILE` on
    /// Windows), then the settings file, then `~/.dotman`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// settings file is malformed.
    pub fn resolve_with(
        home: Option<&Path>,
        store: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let home_var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
        let home = match home {
            Some(path) => path.to_path_buf(),
            None => match env(home_var).filter(|v| !v.is_empty()) {
                Some(value) => PathBuf::from(value),
                None => bail!("cannot determine home directory (${home_var} is not set)"),
            },
        };
        let home = paths::normalize(&std::path::absolute(&home)?);

        let settings_path =
            settings::default_path(env("XDG_CONFIG_HOME").as_deref(), &home);
        let settings = Settings::load(&settings_path)?;

        let store_dir = match store {
            Some(path) => paths::expand(&home, &path.to_string_lossy())?,
            None => match env("DOTMAN_DIR").filter(|v| !v.is_empty()) {
                Some(value) => paths::expand(&home, &value)?,
                None => match &settings.store_dir {
                    Some(value) => paths::expand(&home, value)?,
                    None => home.join(STORE_DIR_NAME),
                },
            },
        };

        let mut config = Self::new(home, store_dir);
        config.default_branch = settings.default_branch;
        config.ignore = settings.ignore;
        Ok(config)
    }

    /// Whether the store directory exists.
    #[must_use]
    pub fn store_exists(&self) -> bool {
        self.store_dir.is_dir()
    }

    /// Whether the manifest file exists.
    #[must_use]
    pub fn manifest_exists(&self) -> bool {
        self.manifest_file.is_file()
    }

    /// Expand a user-supplied path and enforce the home-directory boundary.
    ///
    /// # Errors
    ///
    /// See [`paths::validate`].
    pub fn expand_path(&self, raw: &str) -> Result<PathBuf, PathError> {
        paths::validate(&self.home, raw)
    }

    /// `path` relative to home, or `None` when outside.
    #[must_use]
    pub fn relative_to_home(&self, path: &Path) -> Option<PathBuf> {
        paths::relative_to_home(&self.home, path)
    }

    /// Render `path` as `$HOME/<rel>` for commit messages, falling back to
    /// the path itself when it is not under home.
    #[must_use]
    pub fn home_display(&self, path: &Path) -> String {
        match self.relative_to_home(path) {
            Some(rel) if rel.as_os_str().is_empty() => "$HOME".to_string(),
            Some(rel) => format!("$HOME/{}", rel.to_string_lossy().replace('\\', "/")),
            None => path.display().to_string(),
        }
    }

    /// Absolute location of store-relative `repo_path`.
    #[must_use]
    pub fn stored_path(&self, repo_path: &Path) -> PathBuf {
        self.store_dir.join(repo_path)
    }

    /// Whether `path` is the store itself or lies inside it.
    #[must_use]
    pub fn is_inside_store(&self, path: &Path) -> bool {
        paths::normalize(path).starts_with(paths::normalize(&self.store_dir))
    }

    /// Whether a store-relative path is metadata rather than content.
    #[must_use]
    pub fn should_ignore_repo_path(&self, repo_path: &Path) -> bool {
        paths::is_metadata_path(repo_path, &self.ignore)
    }
}
