//! Core logging types: per-path results and the [`Log`] trait.

/// Outcome of one path in a batch operation, for summary reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// The path as displayed to the user.
    pub path: String,
    /// Final status for the path.
    pub status: PathStatus,
    /// Optional detail (e.g. the error message).
    pub message: Option<String>,
}

/// Status of a path after a batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// The operation completed.
    Ok,
    /// Dry-run mode; nothing was changed.
    DryRun,
    /// The path failed.
    Failed,
}

/// Abstraction over logging backends.
///
/// Command code logs through `Arc<dyn Log>` so tests can substitute a
/// recording implementation.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a per-path result for the summary.
    fn record(&self, path: &str, status: PathStatus, message: Option<&str>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_entry_clone() {
        let entry = PathEntry {
            path: "~/.bashrc".to_string(),
            status: PathStatus::Failed,
            message: Some("already managed".to_string()),
        };
        assert_eq!(entry.clone(), entry);
    }
}
