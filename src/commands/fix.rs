//! `fix`: repair missing or dangling symlinks of managed entries.
use anyhow::Result;

use super::Context;
use crate::error::DotmanError;
use crate::manifest::Coverage;
use crate::resources::link::ManagedLink;
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Counts of what a fix pass found.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixReport {
    /// Links recreated (or that would be under dry-run).
    pub fixed: usize,
    /// Entries that cannot be repaired automatically.
    pub problems: usize,
    /// Entries already correct.
    pub healthy: usize,
}

/// Run the fix command.
///
/// # Errors
///
/// See [`fix`].
pub fn run(ctx: &Context) -> Result<()> {
    fix(ctx)?;
    Ok(())
}

/// Recreate missing and dangling symlinks.
///
/// Symlinks pointing elsewhere and real files at a managed location are
/// reported, never changed.
///
/// # Errors
///
/// Returns an error if the store is missing or the manifest cannot be read.
pub fn fix(ctx: &Context) -> Result<FixReport, DotmanError> {
    ctx.require_store()?;
    let manifest = ctx.load_manifest()?;
    let mut report = FixReport::default();
    if manifest.is_empty() {
        ctx.log.info("No files are managed by dotman.");
        return Ok(report);
    }

    ctx.log.stage("Checking managed symlinks");
    let coverage = Coverage::new(&manifest);
    for entry in manifest.entries() {
        let original = &entry.original_path;
        if coverage.covers(original) {
            continue;
        }
        let link = ManagedLink::new(ctx.config.stored_path(&entry.repo_path), original.clone());
        let state = match link.current_state() {
            Ok(state) => state,
            Err(e) => {
                ctx.log.error(&e.to_string());
                report.problems += 1;
                continue;
            }
        };

        match state {
            ResourceState::Correct => report.healthy += 1,
            ResourceState::Invalid { .. } => {
                ctx.log.warn(&format!(
                    "{}: repository file missing ({})",
                    original.display(),
                    link.stored.display()
                ));
                report.problems += 1;
            }
            ResourceState::Incorrect { current } => {
                ctx.log.warn(&format!(
                    "{}: symlink points to wrong location: {current}",
                    original.display()
                ));
                report.problems += 1;
            }
            ResourceState::Occupied => {
                ctx.log.warn(&format!(
                    "{}: exists but is not a symlink (manual intervention required)",
                    original.display()
                ));
                report.problems += 1;
            }
            ResourceState::Missing | ResourceState::Stale { .. } => {
                if ctx.dry_run {
                    ctx.log.dry_run(&format!("would fix {}", original.display()));
                    report.fixed += 1;
                    continue;
                }
                ctx.log.info(&format!("{}: missing symlink", original.display()));
                match link.apply() {
                    Ok(ResourceChange::Applied) => {
                        ctx.log.info(&format!("fixed {}", original.display()));
                        report.fixed += 1;
                    }
                    Ok(_) => report.healthy += 1,
                    Err(e) => {
                        ctx.log.error(&format!("failed to fix {}: {e}", original.display()));
                        report.problems += 1;
                    }
                }
            }
        }
    }

    if report.fixed > 0 {
        let verb = if ctx.dry_run { "Would fix" } else { "Fixed" };
        ctx.log.info(&format!("{verb} {} file(s)", report.fixed));
    } else if report.problems == 0 {
        ctx.log.info("All symlinks are working correctly.");
    }
    Ok(report)
}
