//! Hierarchy containment: which paths are covered by a managed directory.
use std::path::Path;

use super::{EntryKind, Manifest};

/// Snapshot of the managed directories of a manifest, in manifest order.
#[derive(Debug, Clone)]
pub struct Coverage<'a> {
    dirs: Vec<&'a Path>,
}

impl<'a> Coverage<'a> {
    /// Collect the directory entries of `manifest`.
    #[must_use]
    pub fn new(manifest: &'a Manifest) -> Self {
        let dirs = manifest
            .entries()
            .iter()
            .filter(|e| e.kind == EntryKind::Directory)
            .map(|e| e.original_path.as_path())
            .collect();
        Self { dirs }
    }

    /// The first managed directory that strictly contains `path`.
    ///
    /// Containment is component-wise, so `~/.config/app` does not cover
    /// `~/.config/application.json`, and a directory does not cover itself.
    #[must_use]
    pub fn covering_dir(&self, path: &Path) -> Option<&'a Path> {
        self.dirs
            .iter()
            .copied()
            .find(|dir| path != *dir && path.starts_with(dir))
    }

    /// Whether `path` lies strictly inside a managed directory.
    #[must_use]
    pub fn covers(&self, path: &Path) -> bool {
        self.covering_dir(path).is_some()
    }

    /// Number of managed directories.
    #[must_use]
    pub fn directory_count(&self) -> usize {
        self.dirs.len()
    }

    /// Whether the manifest has no directory entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::ManagedEntry;
    use std::path::PathBuf;

    fn manifest(dirs: &[&str], files: &[&str]) -> Manifest {
        let mut m = Manifest::new();
        for d in dirs {
            m.add_entry(ManagedEntry::new(
                PathBuf::from(d),
                PathBuf::from(d.trim_start_matches("/h/")),
                EntryKind::Directory,
            ));
        }
        for f in files {
            m.add_entry(ManagedEntry::new(
                PathBuf::from(f),
                PathBuf::from(f.trim_start_matches("/h/")),
                EntryKind::File,
            ));
        }
        m
    }

    #[test]
    fn strict_descendant_is_covered() {
        let m = manifest(&["/h/.config/app"], &[]);
        let c = Coverage::new(&m);
        assert!(c.covers(Path::new("/h/.config/app/settings.json")));
        assert!(c.covers(Path::new("/h/.config/app/nested/deep.toml")));
    }

    #[test]
    fn directory_does_not_cover_itself() {
        let m = manifest(&["/h/.config/app"], &[]);
        assert!(!Coverage::new(&m).covers(Path::new("/h/.config/app")));
    }

    #[test]
    fn string_prefix_is_not_coverage() {
        let m = manifest(&["/h/.config/app"], &[]);
        let c = Coverage::new(&m);
        assert!(!c.covers(Path::new("/h/.config/application.json")));
        assert!(!c.covers(Path::new("/h/.config/app2/x")));
    }

    #[test]
    fn first_directory_in_manifest_order_wins() {
        let m = manifest(&["/h/.config", "/h/.config/app"], &[]);
        let c = Coverage::new(&m);
        assert_eq!(
            c.covering_dir(Path::new("/h/.config/app/a.json")).unwrap(),
            Path::new("/h/.config")
        );
    }

    #[test]
    fn files_never_cover() {
        let m = manifest(&[], &["/h/.bashrc"]);
        let c = Coverage::new(&m);
        assert!(c.is_empty());
        assert_eq!(c.directory_count(), 0);
        assert!(!c.covers(Path::new("/h/.bashrc/x")));
    }
}
