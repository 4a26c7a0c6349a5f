//! `status`: report managed paths and the state of the repository.
use std::path::PathBuf;

use anyhow::Result;

use super::Context;
use super::sync::{self, SyncMode};
use super::{cleanup, fix};
use crate::cli::StatusOpts;
use crate::manifest::{Coverage, EntryKind, Manifest};
use crate::resources::fs as rfs;
use crate::vcs::{StatusLine, VersionControl};

/// Health of one managed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// A symlink is in place.
    Ok,
    /// Nothing usable is there (absent or a dangling symlink).
    Missing,
    /// A real file or directory is there.
    NotASymlink,
}

/// Status of one managed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
    /// Location under home.
    pub original_path: PathBuf,
    /// File or directory.
    pub kind: EntryKind,
    /// What is at the location.
    pub health: Health,
}

impl EntryStatus {
    /// One-line rendering, e.g. `✓ /home/u/.bashrc (file) - OK`.
    #[must_use]
    pub fn line(&self) -> String {
        let (mark, label) = match self.health {
            Health::Ok => ('✓', "OK"),
            Health::Missing => ('✗', "Missing"),
            Health::NotASymlink => ('✗', "Not a symlink"),
        };
        format!(
            "{mark} {} ({}) - {label}",
            self.original_path.display(),
            self.kind
        )
    }
}

/// Check every entry not covered by a managed directory.
#[must_use]
pub fn check_entries(manifest: &Manifest) -> Vec<EntryStatus> {
    let coverage = Coverage::new(manifest);
    manifest
        .entries()
        .iter()
        .filter(|e| !(e.kind == EntryKind::File && coverage.covers(&e.original_path)))
        .map(|e| {
            let health = if !rfs::path_exists(&e.original_path) {
                Health::Missing
            } else if rfs::is_symlink(&e.original_path) {
                Health::Ok
            } else {
                Health::NotASymlink
            };
            EntryStatus {
                original_path: e.original_path.clone(),
                kind: e.kind,
                health,
            }
        })
        .collect()
}

fn change_line(line: &StatusLine) -> String {
    let sign = match line.code.as_str() {
        "??" | "A " => '+',
        " D" | "D " => '-',
        _ => '~',
    };
    format!("  {sign} {} ({})", line.path, line.label())
}

/// Lines describing the repository: branch, remote, commits and changes.
///
/// Failures of individual queries are shown inline rather than aborting.
#[must_use]
pub fn repo_summary(vcs: &dyn VersionControl) -> Vec<String> {
    if !vcs.is_repo() {
        return vec!["Git repository: Not initialized".to_string()];
    }

    let mut lines = Vec::new();
    lines.push(match vcs.current_branch() {
        Ok(branch) => format!("Branch: {branch}"),
        Err(_) => "Branch: <unknown>".to_string(),
    });
    lines.push(match vcs.remote_url() {
        Ok(Some(url)) => format!("Remote: {url}"),
        Ok(None) | Err(_) => "Remote: <not configured>".to_string(),
    });
    if let Ok(count) = vcs.commit_count() {
        lines.push(format!("Commits: {count}"));
    }
    match vcs.status() {
        Ok(changes) if changes.is_empty() => lines.push("Status: Clean (no changes)".to_string()),
        Ok(changes) => {
            lines.push("Status: Uncommitted changes".to_string());
            lines.extend(changes.iter().map(change_line));
        }
        Err(e) => lines.push(format!("Status: <unavailable> ({e})")),
    }
    lines
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or a requested fix fails.
pub fn run(ctx: &Context, opts: &StatusOpts) -> Result<()> {
    if !ctx.config.store_exists() {
        ctx.log.info(
            "Dotman not initialized. Use 'dotman init' or 'dotman add' to start managing files.",
        );
        return Ok(());
    }

    if opts.cleanup
        && let Err(e) = cleanup::cleanup(ctx)
    {
        ctx.log.warn(&format!("cleanup failed: {e}"));
    }
    if opts.sync
        && let Err(e) = sync::discover(ctx, SyncMode::Auto)
    {
        ctx.log.warn(&format!("sync failed: {e:#}"));
    }

    let manifest = ctx.load_manifest()?;
    if manifest.is_empty() {
        ctx.log.info("No files are currently managed by dotman.");
    } else {
        let statuses = check_entries(&manifest);
        ctx.log.stage(&format!(
            "Dotman is managing {} path(s)",
            statuses.len()
        ));
        for status in &statuses {
            if status.health == Health::Ok {
                ctx.log.info(&status.line());
            } else {
                ctx.log.warn(&status.line());
            }
        }

        let broken = statuses.iter().filter(|s| s.health != Health::Ok).count();
        if opts.fix {
            if broken > 0 {
                ctx.log.info(&format!("Found {broken} broken symlink(s)."));
                fix::fix(ctx)?;
            } else {
                ctx.log.info("All symlinks are working correctly.");
            }
        }
    }

    ctx.log.stage("Git repository");
    for line in repo_summary(ctx.vcs.as_ref()) {
        ctx.log.info(&line);
    }
    Ok(())
}
