//! Domain-specific error types for dotman.
//!
//! Each layer returns its own typed error built with [`thiserror`]; command
//! entry points convert them to [`anyhow::Error`] via the standard `?`
//! operator and attach context there.
//!
//! # Error hierarchy
//!
//! ```text
//! DotmanError
//! ├── Path(PathError)         home-directory boundary, path resolution
//! ├── Fs(FsError)             move, link, restore, backup
//! ├── Manifest(ManifestError) index.json read/parse/write
//! ├── Git(GitError)           git subprocess failures
//! └── Command(CommandError)   per-command preconditions
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a single dotman operation.
///
/// Per-path operations (`add`, `remove`) return this so a batch can report
/// each failure precisely while carrying on with the next path.
#[derive(Error, Debug)]
pub enum DotmanError {
    /// The path failed validation (security boundary).
    #[error(transparent)]
    Path(#[from] PathError),

    /// A filesystem operation failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// The manifest could not be read or written.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The version-control backend failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A command precondition was violated.
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl DotmanError {
    /// Whether this error is a refusal to touch something the user has to
    /// sort out by hand (e.g. a real file where a symlink is expected).
    #[must_use]
    pub const fn needs_manual_intervention(&self) -> bool {
        matches!(self, Self::Fs(FsError::NotASymlink(_)))
    }

    /// Whether this error is a home-directory boundary violation.
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::Path(PathError::OutsideHome { .. }))
    }
}

/// Errors raised by the path validator.
#[derive(Error, Debug)]
pub enum PathError {
    /// The resolved path lies outside the home directory.
    #[error("path must be inside home directory: {}", path.display())]
    OutsideHome {
        /// The offending, fully resolved path.
        path: PathBuf,
    },

    /// The path could not be made absolute.
    #[error("failed to resolve absolute path for '{raw}': {source}")]
    Resolve {
        /// The raw path as supplied by the user.
        raw: String,
        /// Underlying I/O error (usually an unreadable current directory).
        source: io::Error,
    },
}

/// Errors raised by filesystem operations on managed paths.
#[derive(Error, Debug)]
pub enum FsError {
    /// An I/O call failed.
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        /// Short description of what was attempted (e.g. `"create symlink at"`).
        action: &'static str,
        /// The path the action was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Something already occupies the path that was about to be created.
    #[error("path already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// The path was expected to be a symlink but is a real file or directory.
    #[error("{} is not a symlink (manual intervention required)", .0.display())]
    NotASymlink(PathBuf),
}

impl FsError {
    /// Build a closure that wraps an [`io::Error`] for `action` on `path`.
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

/// Errors raised while loading or saving the manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file exists but could not be read.
    #[error("failed to read index file {}: {source}", path.display())]
    Read {
        /// Path to the manifest.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The manifest file is not valid JSON or has the wrong shape.
    #[error("failed to parse index file {}: {source}", path.display())]
    Parse {
        /// Path to the manifest.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The in-memory manifest could not be serialized.
    #[error("failed to serialize index: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The manifest could not be written to disk.
    #[error("failed to write index file {}: {source}", path.display())]
    Write {
        /// Path being written (the temp file or the final manifest).
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Errors raised by the git adapter.
#[derive(Error, Debug)]
pub enum GitError {
    /// `git` is not on `PATH`.
    #[error("git is not installed or not on PATH")]
    NotInstalled,

    /// The `git` process could not be spawned.
    #[error("failed to run git {command}: {source}")]
    Spawn {
        /// Subcommand and arguments, space separated.
        command: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// `git` exited with a failure status.
    #[error("git {command} failed (exit {code}): {output}")]
    Failed {
        /// Subcommand and arguments, space separated.
        command: String,
        /// Exit code, or `-1` when terminated by a signal.
        code: i32,
        /// Combined stdout and stderr of the process.
        output: String,
    },

    /// `git` succeeded but printed something unexpected.
    #[error("unexpected output from git {command}: {output}")]
    UnexpectedOutput {
        /// Subcommand and arguments, space separated.
        command: String,
        /// The output that could not be interpreted.
        output: String,
    },

    /// No `origin` remote is configured.
    #[error("no remote origin configured")]
    NoRemote,

    /// A file inside the repository could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Precondition violations detected by the command orchestrator.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The store directory does not exist.
    #[error("dotman directory does not exist: {}", .0.display())]
    StoreMissing(PathBuf),

    /// The store directory already exists (e.g. before `clone`).
    #[error("dotman directory already exists: {}", .0.display())]
    StoreExists(PathBuf),

    /// The store directory exists but holds neither a repository nor a manifest.
    #[error("directory {} exists but is not a dotman store", .0.display())]
    NotAStore(PathBuf),

    /// The store is not a git repository.
    #[error("dotman directory is not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// The path to add does not exist.
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    /// The path is already recorded in the manifest.
    #[error("path is already managed: {}", .0.display())]
    AlreadyManaged(PathBuf),

    /// The path lies inside a directory that is already managed.
    #[error("{} is already managed as part of {}", path.display(), dir.display())]
    CoveredByDirectory {
        /// The path that was requested.
        path: PathBuf,
        /// The managed directory containing it.
        dir: PathBuf,
    },

    /// The path is a directory holding paths that are already managed.
    #[error(
        "{} contains {count} managed path(s); remove them before adding the directory",
        path.display()
    )]
    ContainsManaged {
        /// The path that was requested.
        path: PathBuf,
        /// Number of manifest entries stored beneath it.
        count: usize,
    },

    /// The path is not recorded in the manifest.
    #[error("path is not managed by dotman: {}", .0.display())]
    NotManaged(PathBuf),

    /// The store already holds content at the destination for this path.
    #[error("store already contains {} (use --force to replace it)", .0.display())]
    AlreadyInStore(PathBuf),

    /// The home directory itself cannot be managed.
    #[error("refusing to manage the home directory itself")]
    HomeDirectory,

    /// Paths inside the store cannot be managed.
    #[error("path is inside the dotman directory: {}", .0.display())]
    InsideStore(PathBuf),

    /// A cloned repository is not a usable dotman store.
    #[error("cloned repository is not a dotman store: {0}")]
    InvalidClone(String),

    /// Every path of a batch operation failed.
    #[error("all {count} operation(s) failed")]
    AllFailed {
        /// Number of paths attempted.
        count: usize,
    },
}
