//! Path expansion and the home-directory boundary check.
//!
//! Every user-supplied path goes through [`validate`] before any mutating
//! operation. Paths are normalized lexically (no symlink resolution) so the
//! check sees exactly the location that will be moved or linked.
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// Names at the store root that are never treated as managed content.
const ROOT_METADATA: &[&str] = &["index.json", ".gitignore"];

/// Collapse `.` and `..` segments without touching the filesystem.
///
/// A `..` that would climb above the root of an absolute path is dropped.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Expand `raw` to an absolute, normalized path.
///
/// `~` is the home directory, `~/rest` is joined onto it and anything else
/// is resolved against the current directory.
///
/// # Errors
///
/// Returns [`PathError::Resolve`] if the current directory is unavailable.
pub fn expand(home: &Path, raw: &str) -> Result<PathBuf, PathError> {
    let expanded = if raw == "~" {
        home.to_path_buf()
    } else if let Some(rest) = raw
        .strip_prefix("~/")
        .or_else(|| raw.strip_prefix("~\\").filter(|_| cfg!(windows)))
    {
        home.join(rest)
    } else {
        std::path::absolute(raw).map_err(|source| PathError::Resolve {
            raw: raw.to_string(),
            source,
        })?
    };
    Ok(normalize(&expanded))
}

/// Return `path` relative to `home`, or `None` when it lies outside.
///
/// Both sides are compared after normalization and with Windows verbatim
/// prefixes removed.
#[must_use]
pub fn relative_to_home(home: &Path, path: &Path) -> Option<PathBuf> {
    let home = normalize(dunce::simplified(home));
    let path = normalize(dunce::simplified(path));
    path.strip_prefix(&home).ok().map(Path::to_path_buf)
}

/// Expand `raw` and reject it unless it lies inside `home`.
///
/// # Errors
///
/// Returns [`PathError::OutsideHome`] for paths outside the home directory
/// and [`PathError::Resolve`] when the path cannot be made absolute.
pub fn validate(home: &Path, raw: &str) -> Result<PathBuf, PathError> {
    let path = expand(home, raw)?;
    if relative_to_home(home, &path).is_none() {
        return Err(PathError::OutsideHome { path });
    }
    Ok(path)
}

/// Whether a store-relative path is repository metadata rather than content.
///
/// Matches `.git` and `.dotman` trees, the manifest, `.gitignore`, a
/// top-level `README.md` in any case, and any top-level name in `extra`.
#[must_use]
pub fn is_metadata_path(rel: &Path, extra: &[String]) -> bool {
    let mut names = rel.components().filter_map(|c| match c {
        Component::Normal(name) => Some(name),
        _ => None,
    });
    let Some(first) = names.next() else {
        return false;
    };
    let top_level = names.next().is_none();

    if first == OsStr::new(".git") || first == OsStr::new(".dotman") {
        return true;
    }
    if extra.iter().any(|name| first == OsStr::new(name)) {
        return true;
    }
    top_level
        && (first.eq_ignore_ascii_case("readme.md")
            || ROOT_METADATA.iter().any(|name| first == OsStr::new(name)))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn home() -> PathBuf {
        PathBuf::from("/home/user")
    }

    // ---- normalize ----

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(
            normalize(Path::new("/home/user/./a/../b")),
            PathBuf::from("/home/user/b")
        );
    }

    #[test]
    fn normalize_does_not_climb_above_root() {
        assert_eq!(normalize(Path::new("/../../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn normalize_keeps_leading_parent_on_relative_paths() {
        assert_eq!(normalize(Path::new("../x/./y")), PathBuf::from("../x/y"));
    }

    // ---- expand ----

    #[test]
    fn tilde_is_home() {
        assert_eq!(expand(&home(), "~").unwrap(), home());
    }

    #[test]
    fn tilde_slash_joins_home() {
        assert_eq!(
            expand(&home(), "~/.config/nvim").unwrap(),
            PathBuf::from("/home/user/.config/nvim")
        );
    }

    #[cfg(unix)]
    #[test]
    fn absolute_path_is_kept() {
        assert_eq!(
            expand(&home(), "/home/user/.bashrc").unwrap(),
            PathBuf::from("/home/user/.bashrc")
        );
    }

    #[test]
    fn relative_path_resolves_against_cwd() {
        let expanded = expand(&home(), "some-file").unwrap();
        assert!(expanded.is_absolute());
        assert!(expanded.ends_with("some-file"));
    }

    // ---- boundary ----

    #[cfg(unix)]
    #[test]
    fn rejects_paths_outside_home() {
        let err = validate(&home(), "/etc/hosts").unwrap_err();
        assert!(matches!(err, PathError::OutsideHome { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_dot_dot_escape() {
        let err = validate(&home(), "~/../other/.bashrc").unwrap_err();
        assert!(
            matches!(err, PathError::OutsideHome { ref path } if path == Path::new("/home/other/.bashrc")),
            "got {err:?}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn rejects_string_prefix_sibling() {
        assert!(
            validate(&home(), "/home/username/.bashrc").is_err(),
            "component-wise comparison must reject /home/username"
        );
    }

    #[test]
    fn accepts_home_itself_and_children() {
        assert_eq!(validate(&home(), "~").unwrap(), home());
        assert!(validate(&home(), "~/.bashrc").is_ok());
    }

    #[test]
    fn relative_to_home_strips_prefix() {
        assert_eq!(
            relative_to_home(&home(), Path::new("/home/user/.config/app")),
            Some(PathBuf::from(".config/app"))
        );
        assert_eq!(relative_to_home(&home(), Path::new("/tmp/x")), None);
    }

    // ---- metadata ----

    #[test]
    fn metadata_paths() {
        let none: &[String] = &[];
        assert!(is_metadata_path(Path::new(".git/config"), none));
        assert!(is_metadata_path(Path::new(".dotman"), none));
        assert!(is_metadata_path(Path::new(".dotman/state"), none));
        assert!(is_metadata_path(Path::new("index.json"), none));
        assert!(is_metadata_path(Path::new(".gitignore"), none));
        assert!(is_metadata_path(Path::new("README.md"), none));
        assert!(is_metadata_path(Path::new("readme.MD"), none));
    }

    #[test]
    fn content_paths_are_not_metadata() {
        let none: &[String] = &[];
        assert!(!is_metadata_path(Path::new(".gitconfig"), none));
        assert!(!is_metadata_path(Path::new(".github/workflows/ci.yml"), none));
        assert!(!is_metadata_path(Path::new(".config/app/README.md"), none));
        assert!(!is_metadata_path(Path::new(".config/app/index.json"), none));
        assert!(!is_metadata_path(Path::new(""), none));
    }

    #[test]
    fn extra_names_from_settings() {
        let extra = vec!["LICENSE".to_string(), "scripts".to_string()];
        assert!(is_metadata_path(Path::new("LICENSE"), &extra));
        assert!(is_metadata_path(Path::new("scripts/setup.sh"), &extra));
        assert!(!is_metadata_path(Path::new(".bashrc"), &extra));
    }
}
