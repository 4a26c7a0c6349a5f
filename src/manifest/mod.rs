//! The manifest (`index.json`): every path dotman manages.
//!
//! Loaded at the start of a mutating command, changed in memory and written
//! back wholesale with [`Manifest::save`]. Nothing is cached across commands.

pub mod coverage;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ManifestError;

pub use coverage::Coverage;

/// Manifest format version written by this crate.
pub const FORMAT_VERSION: &str = "1.0";

/// Kind of a managed filesystem item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory; everything below it is covered.
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

/// One managed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedEntry {
    /// Absolute location under home where the symlink lives.
    pub original_path: PathBuf,
    /// Location of the real content, relative to the store root.
    pub repo_path: PathBuf,
    /// File or directory.
    #[serde(rename = "type", alias = "kind")]
    pub kind: EntryKind,
    /// When the entry was added.
    #[serde(rename = "added_date", alias = "added_at")]
    pub added_at: DateTime<Utc>,
}

impl ManagedEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(original_path: PathBuf, repo_path: PathBuf, kind: EntryKind) -> Self {
        Self {
            original_path,
            repo_path,
            kind,
            added_at: Utc::now(),
        }
    }

    /// Whether the entry is a directory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// The ordered collection of managed entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Format version string.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(
        rename = "managed_files",
        alias = "entries",
        default,
        deserialize_with = "null_as_empty"
    )]
    entries: Vec<ManagedEntry>,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

/// `"managed_files": null` is read as an empty list.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ManagedEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ManagedEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: default_version(),
            entries: Vec::new(),
        }
    }
}

impl Manifest {
    /// Create an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the manifest at `path`. A missing file is an empty manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] or [`ManifestError::Parse`] when the
    /// file exists but cannot be read or is not a valid manifest.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(ManifestError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the manifest to `path` as pretty-printed JSON.
    ///
    /// The content goes to a sibling temp file first and is renamed into
    /// place, so a crash never leaves a truncated manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Serialize`] or [`ManifestError::Write`].
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let mut json = serde_json::to_string_pretty(self).map_err(ManifestError::Serialize)?;
        json.push('\n');

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        fs::write(&tmp, json).map_err(|source| ManifestError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| {
            fs::remove_file(&tmp).ok();
            ManifestError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Append `entry`. Returns `false` (and changes nothing) when its
    /// `original_path` is already present.
    pub fn add_entry(&mut self, entry: ManagedEntry) -> bool {
        if self.is_managed(&entry.original_path) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Remove and return the entry for `original_path`, if any.
    pub fn remove_entry(&mut self, original_path: &Path) -> Option<ManagedEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.original_path == original_path)?;
        Some(self.entries.remove(index))
    }

    /// Remove every entry whose `original_path` is in `paths`. Returns the
    /// number removed.
    pub fn remove_all(&mut self, paths: &[PathBuf]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !paths.contains(&e.original_path));
        before - self.entries.len()
    }

    /// Look up the entry for `original_path`.
    #[must_use]
    pub fn find_entry(&self, original_path: &Path) -> Option<&ManagedEntry> {
        self.entries.iter().find(|e| e.original_path == original_path)
    }

    /// Whether `original_path` has an entry.
    #[must_use]
    pub fn is_managed(&self, original_path: &Path) -> bool {
        self.find_entry(original_path).is_some()
    }

    /// All entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[ManagedEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File entries that lie strictly inside a managed directory, paired
    /// with the directory covering them.
    #[must_use]
    pub fn covered_files(&self) -> Vec<(&ManagedEntry, &Path)> {
        let coverage = Coverage::new(self);
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::File)
            .filter_map(|e| coverage.covering_dir(&e.original_path).map(|dir| (e, dir)))
            .collect()
    }
}
