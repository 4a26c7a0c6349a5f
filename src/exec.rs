//! External command execution behind the [`Executor`] seam.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Stdout and stderr joined and trimmed, for error reports.
    #[must_use]
    pub fn combined(&self) -> String {
        let out = self.stdout.trim();
        let err = self.stderr.trim();
        match (out.is_empty(), err.is_empty()) {
            (true, _) => err.to_string(),
            (false, true) => out.to_string(),
            (false, false) => format!("{out}\n{err}"),
        }
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Seam for running external programs.
///
/// The git adapter goes through this trait so tests can script responses
/// without a `git` binary.
pub trait Executor: Send + Sync + fmt::Debug {
    /// Run `program` with `args`, optionally inside `dir`, and return its
    /// output regardless of exit status. Only a spawn failure is an error.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the process cannot be started.
    fn run_unchecked(&self, dir: Option<&Path>, program: &str, args: &[&str])
    -> io::Result<ExecResult>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_unchecked(
        &self,
        dir: Option<&Path>,
        program: &str,
        args: &[&str],
    ) -> io::Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        tracing::debug!("exec: {program} {}", args.join(" "));
        cmd.output().map(ExecResult::from)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
