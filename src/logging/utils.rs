//! Helpers for log file placement, ANSI stripping and timestamps.
use std::path::{Path, PathBuf};

/// Strip ANSI escape sequences from a string.
///
/// Handles SGR sequences (ending in `m`) and other CSI sequences (ending
/// in any letter in the `@`..`~` range).
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.next() == Some('[') {
                for inner in chars.by_ref() {
                    if ('@'..='~').contains(&inner) {
                        break;
                    }
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Resolve the dotman cache directory from explicit environment values.
///
/// `$XDG_CACHE_HOME/dotman`, else `<home>/.cache/dotman`, else `./.cache/dotman`.
fn cache_dir_from(xdg_cache: Option<&str>, home: Option<&str>) -> PathBuf {
    let base = match (xdg_cache, home) {
        (Some(xdg), _) if !xdg.is_empty() => PathBuf::from(xdg),
        (_, Some(home)) => Path::new(home).join(".cache"),
        _ => PathBuf::from(".cache"),
    };
    base.join("dotman")
}

/// Return the `$XDG_CACHE_HOME/dotman/` directory (not created).
pub(super) fn cache_dir() -> PathBuf {
    let xdg = std::env::var("XDG_CACHE_HOME").ok();
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok();
    cache_dir_from(xdg.as_deref(), home.as_deref())
}

/// Return the log file path for `command` under the cache directory.
pub(super) fn log_file_path(command: &str) -> PathBuf {
    cache_dir().join(format!("{command}.log"))
}

/// Format the current UTC time as `YYYY-MM-DD HH:MM:SS`.
pub(super) fn format_utc_datetime() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format the current UTC time as `HH:MM:SS`.
pub(super) fn format_utc_time() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}
