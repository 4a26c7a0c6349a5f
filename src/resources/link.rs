//! The symlink of one manifest entry, as a checkable resource.
use std::path::PathBuf;

use super::fs;
use super::{Resource, ResourceChange, ResourceState};
use crate::error::FsError;

/// The pair (stored content, original location) of one managed entry.
#[derive(Debug, Clone)]
pub struct ManagedLink {
    /// Real content inside the store.
    pub stored: PathBuf,
    /// Location under home where the symlink belongs.
    pub original: PathBuf,
    /// Replace symlinks pointing somewhere other than `stored`.
    pub force: bool,
}

impl ManagedLink {
    /// Create a link resource that never replaces wrong-target symlinks.
    #[must_use]
    pub const fn new(stored: PathBuf, original: PathBuf) -> Self {
        Self {
            stored,
            original,
            force: false,
        }
    }

    /// Allow replacing symlinks that point elsewhere.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

impl Resource for ManagedLink {
    fn description(&self) -> String {
        format!("{} -> {}", self.original.display(), self.stored.display())
    }

    fn current_state(&self) -> Result<ResourceState, FsError> {
        if !fs::path_exists(&self.stored) {
            return Ok(ResourceState::Invalid {
                reason: format!("stored content missing: {}", self.stored.display()),
            });
        }

        match self.original.symlink_metadata() {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ResourceState::Missing),
            Err(source) => Err(FsError::Io {
                action: "inspect",
                path: self.original.clone(),
                source,
            }),
            Ok(meta) if !meta.file_type().is_symlink() => Ok(ResourceState::Occupied),
            Ok(_) => {
                let Some(target) = fs::link_target(&self.original) else {
                    return Ok(ResourceState::Stale {
                        current: String::new(),
                    });
                };
                let current = target.display().to_string();
                if fs::paths_equal(&target, &self.stored) {
                    Ok(ResourceState::Correct)
                } else if fs::path_exists(&target) {
                    Ok(ResourceState::Incorrect { current })
                } else {
                    Ok(ResourceState::Stale { current })
                }
            }
        }
    }

    fn apply(&self) -> Result<ResourceChange, FsError> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Missing => {
                fs::link(&self.original, &self.stored)?;
                Ok(ResourceChange::Applied)
            }
            ResourceState::Stale { .. } => {
                fs::remove_link(&self.original)?;
                fs::link(&self.original, &self.stored)?;
                Ok(ResourceChange::Applied)
            }
            ResourceState::Incorrect { .. } if self.force => {
                fs::remove_link(&self.original)?;
                fs::link(&self.original, &self.stored)?;
                Ok(ResourceChange::Applied)
            }
            ResourceState::Incorrect { current } => Ok(ResourceChange::Skipped {
                reason: format!("symlink points to {current}"),
            }),
            ResourceState::Occupied => Ok(ResourceChange::Skipped {
                reason: "a real file or directory is in the way".to_string(),
            }),
            ResourceState::Invalid { reason } => Ok(ResourceChange::Skipped { reason }),
        }
    }

    fn remove(&self) -> Result<ResourceChange, FsError> {
        fs::unlink_and_restore(&self.original, &self.stored)?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use std::os::unix::fs::symlink;

    struct Fixture {
        _tmp: tempfile::TempDir,
        stored: PathBuf,
        original: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let stored = tmp.path().join("store/.bashrc");
        stdfs::create_dir_all(stored.parent().unwrap()).unwrap();
        stdfs::write(&stored, "stored").unwrap();
        let original = tmp.path().join("home/.bashrc");
        stdfs::create_dir_all(original.parent().unwrap()).unwrap();
        Fixture {
            _tmp: tmp,
            stored,
            original,
        }
    }

    fn resource(f: &Fixture) -> ManagedLink {
        ManagedLink::new(f.stored.clone(), f.original.clone())
    }

    // ---- state ----

    #[test]
    fn missing_when_nothing_at_original() {
        let f = fixture();
        assert_eq!(resource(&f).current_state().unwrap(), ResourceState::Missing);
    }

    #[test]
    fn invalid_when_stored_content_missing() {
        let f = fixture();
        stdfs::remove_file(&f.stored).unwrap();
        assert!(matches!(
            resource(&f).current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
    }

    #[test]
    fn correct_when_linked_to_store() {
        let f = fixture();
        symlink(&f.stored, &f.original).unwrap();
        assert_eq!(resource(&f).current_state().unwrap(), ResourceState::Correct);
    }

    #[test]
    fn occupied_by_real_file() {
        let f = fixture();
        stdfs::write(&f.original, "local").unwrap();
        assert_eq!(resource(&f).current_state().unwrap(), ResourceState::Occupied);
    }

    #[test]
    fn stale_when_link_dangles() {
        let f = fixture();
        symlink(f.stored.with_file_name("gone"), &f.original).unwrap();
        assert!(matches!(
            resource(&f).current_state().unwrap(),
            ResourceState::Stale { .. }
        ));
    }

    #[test]
    fn incorrect_when_link_points_elsewhere() {
        let f = fixture();
        let other = f.stored.with_file_name("other");
        stdfs::write(&other, "other").unwrap();
        symlink(&other, &f.original).unwrap();
        assert!(matches!(
            resource(&f).current_state().unwrap(),
            ResourceState::Incorrect { .. }
        ));
        assert!(resource(&f).needs_change().unwrap());
    }

    // ---- apply ----

    #[test]
    fn apply_creates_missing_link() {
        let f = fixture();
        assert_eq!(resource(&f).apply().unwrap(), ResourceChange::Applied);
        assert_eq!(stdfs::read_to_string(&f.original).unwrap(), "stored");
    }

    #[test]
    fn apply_replaces_stale_link() {
        let f = fixture();
        symlink(f.stored.with_file_name("gone"), &f.original).unwrap();
        assert_eq!(resource(&f).apply().unwrap(), ResourceChange::Applied);
        assert_eq!(resource(&f).current_state().unwrap(), ResourceState::Correct);
    }

    #[test]
    fn apply_never_touches_real_files() {
        let f = fixture();
        stdfs::write(&f.original, "local").unwrap();
        let change = resource(&f).with_force(true).apply().unwrap();
        assert!(matches!(change, ResourceChange::Skipped { .. }));
        assert_eq!(stdfs::read_to_string(&f.original).unwrap(), "local");
    }

    #[test]
    fn apply_replaces_wrong_target_only_when_forced() {
        let f = fixture();
        let other = f.stored.with_file_name("other");
        stdfs::write(&other, "other").unwrap();
        symlink(&other, &f.original).unwrap();

        let change = resource(&f).apply().unwrap();
        assert!(matches!(change, ResourceChange::Skipped { .. }));

        let change = resource(&f).with_force(true).apply().unwrap();
        assert_eq!(change, ResourceChange::Applied);
        assert_eq!(stdfs::read_to_string(&f.original).unwrap(), "stored");
        assert_eq!(stdfs::read_to_string(&other).unwrap(), "other");
    }

    #[test]
    fn apply_on_correct_link_is_noop() {
        let f = fixture();
        symlink(&f.stored, &f.original).unwrap();
        let before = stdfs::symlink_metadata(&f.original).unwrap().modified().unwrap();
        assert_eq!(resource(&f).apply().unwrap(), ResourceChange::AlreadyCorrect);
        let after = stdfs::symlink_metadata(&f.original).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    // ---- remove ----

    #[test]
    fn remove_restores_content() {
        let f = fixture();
        symlink(&f.stored, &f.original).unwrap();
        resource(&f).remove().unwrap();
        assert!(!fs::is_symlink(&f.original));
        assert_eq!(stdfs::read_to_string(&f.original).unwrap(), "stored");
    }
}
