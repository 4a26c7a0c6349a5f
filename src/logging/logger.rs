//! Structured logger with dry-run awareness and per-path summary collection.
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::types::{Log, PathEntry, PathStatus};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger.
///
/// Messages are emitted as [`tracing`] events; the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) renders them on
/// the console and appends them to `$XDG_CACHE_HOME/dotman/<command>.log`.
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<PathEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a logger for `command`.
    ///
    /// Only remembers the log file path for the summary; the file itself is
    /// created by the subscriber's file layer.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self::with_log_file(Some(log_file_path(command)))
    }

    /// Create a logger reporting `log_file` in its summary.
    #[must_use]
    pub const fn with_log_file(log_file: Option<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Return the log file path, if any.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Snapshot of all recorded per-path results.
    #[must_use]
    pub fn entries(&self) -> Vec<PathEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: "dotman::stage", "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (console only with `--verbose`, always in the file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: "dotman::dry_run", "{msg}");
    }

    /// Record a per-path result for the summary.
    pub fn record(&self, path: &str, status: PathStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(PathEntry {
                path: path.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count the recorded failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|e| e.status == PathStatus::Failed)
                .count()
        })
    }

    /// Log the summary of recorded per-path results.
    ///
    /// Nothing is printed for single-path runs.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.len() < 2 {
            return;
        }

        self.stage("Summary");

        let mut ok = 0usize;
        let mut dry_run = 0usize;
        let mut failed = 0usize;

        for entry in &entries {
            let (icon, color) = match entry.status {
                PathStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                PathStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                PathStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };
            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));
            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", entry.path));
        }

        let total = entries.len();
        self.info(&format!(
            "{total} paths: \x1b[32m{ok} ok\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record(&self, path: &str, status: PathStatus, message: Option<&str>) {
        self.record(path, status, message);
    }
}
