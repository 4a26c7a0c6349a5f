//! Filesystem primitives for moving content into the store and linking it back.
//!
//! Every function returns [`FsError`] naming the path and the action that
//! failed. Nothing here consults the manifest.
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FsError;
use crate::manifest::EntryKind;

/// Suffix appended to a path to form its backup sibling.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Ensure the parent directory of `path` exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), FsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(FsError::io("create directory", parent))?;
    }
    Ok(())
}

/// Move `original` to `destination`, creating intermediate directories.
///
/// A plain rename: moving across filesystems fails rather than copying.
///
/// # Errors
///
/// Returns an error if the parent cannot be created or the rename fails.
pub fn move_into_store(original: &Path, destination: &Path) -> Result<(), FsError> {
    ensure_parent_dir(destination)?;
    fs::rename(original, destination).map_err(FsError::io("move into store", original))
}

/// Create a symlink at `original` pointing to `destination`.
///
/// # Errors
///
/// Returns [`FsError::AlreadyExists`] if anything (including a dangling
/// symlink) is at `original`, or an I/O error if the link cannot be created.
pub fn link(original: &Path, destination: &Path) -> Result<(), FsError> {
    ensure_parent_dir(original)?;
    if original.symlink_metadata().is_ok() {
        return Err(FsError::AlreadyExists(original.to_path_buf()));
    }
    create_symlink(destination, original)
}

/// Replace the symlink at `original` with the content at `destination`.
///
/// # Errors
///
/// Returns [`FsError::NotASymlink`] if `original` is not a symlink, or an
/// I/O error if the link cannot be removed or the content moved back.
pub fn unlink_and_restore(original: &Path, destination: &Path) -> Result<(), FsError> {
    if !is_symlink(original) {
        return Err(FsError::NotASymlink(original.to_path_buf()));
    }
    remove_link(original)?;
    fs::rename(destination, original).map_err(FsError::io("restore", original))
}

/// Whether `path` exists, following symlinks.
#[must_use]
pub fn path_exists(path: &Path) -> bool {
    path.exists()
}

/// Whether `path` itself is a symlink (dangling links included).
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| m.file_type().is_symlink())
}

/// Whether `path` is a directory, following symlinks.
#[must_use]
pub fn is_directory(path: &Path) -> bool {
    path.is_dir()
}

/// Manifest kind for the item at `path`.
#[must_use]
pub fn kind_of(path: &Path) -> EntryKind {
    if is_directory(path) {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

/// Where `path` resolves when read as a symlink.
///
/// Relative link targets are resolved against the link's parent. Returns
/// `None` when `path` is not a symlink.
#[must_use]
pub fn link_target(path: &Path) -> Option<PathBuf> {
    let target = fs::read_link(path).ok()?;
    if target.is_absolute() {
        return Some(target);
    }
    Some(path.parent().unwrap_or_else(|| Path::new("")).join(target))
}

/// Compare two paths, ignoring Windows verbatim prefixes.
#[must_use]
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    crate::config::paths::normalize(dunce::simplified(a))
        == crate::config::paths::normalize(dunce::simplified(b))
}

/// The backup sibling of `path` (`<path>.backup`).
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Copy `path` to its backup sibling, replacing any previous backup.
///
/// Permissions of files and directories are preserved.
///
/// # Errors
///
/// Returns an error if the previous backup cannot be removed or the copy fails.
pub fn backup(path: &Path) -> Result<PathBuf, FsError> {
    let target = backup_path(path);
    if target.symlink_metadata().is_ok() {
        remove_path(&target)?;
    }
    if is_directory(path) {
        copy_dir_recursive(path, &target)?;
    } else {
        fs::copy(path, &target).map_err(FsError::io("back up", path))?;
    }
    Ok(target)
}

/// Recursively copy a directory tree, preserving permissions.
///
/// Symlinks inside the tree are followed and their content copied.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or read, or a file
/// cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), FsError> {
    fs::create_dir_all(dst).map_err(FsError::io("create directory", dst))?;
    for entry in fs::read_dir(src).map_err(FsError::io("read directory", src))? {
        let entry = entry.map_err(FsError::io("read entry in", src))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).map_err(FsError::io("copy", &src_path))?;
        }
    }
    let permissions = fs::metadata(src)
        .map_err(FsError::io("read metadata of", src))?
        .permissions();
    fs::set_permissions(dst, permissions).map_err(FsError::io("set permissions on", dst))
}

/// Remove whatever is at `path`: a symlink, a file or a whole tree.
///
/// # Errors
///
/// Returns an error if removal fails.
pub fn remove_path(path: &Path) -> Result<(), FsError> {
    let meta = path
        .symlink_metadata()
        .map_err(FsError::io("read metadata of", path))?;
    if meta.file_type().is_symlink() {
        remove_link(path)
    } else if meta.is_dir() {
        fs::remove_dir_all(path).map_err(FsError::io("remove", path))
    } else {
        fs::remove_file(path).map_err(FsError::io("remove", path))
    }
}

/// Remove a symlink, handling directory symlinks on Windows.
///
/// # Errors
///
/// Returns an error if the link cannot be removed.
pub fn remove_link(path: &Path) -> Result<(), FsError> {
    let meta = path
        .symlink_metadata()
        .map_err(FsError::io("read metadata of", path))?;
    if is_dir_like(&meta) {
        fs::remove_dir(path).map_err(FsError::io("remove symlink", path))
    } else {
        fs::remove_file(path).map_err(FsError::io("remove symlink", path))
    }
}

/// On Windows `symlink_metadata().is_dir()` is `false` for directory
/// symlinks, so the raw `FILE_ATTRIBUTE_DIRECTORY` bit is checked instead.
fn is_dir_like(meta: &fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt as _;
        meta.file_attributes() & 0x10 != 0
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> Result<(), FsError> {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);

    #[cfg(windows)]
    let result = if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    };

    result.map_err(FsError::io("create symlink at", link))
}
