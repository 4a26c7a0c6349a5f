//! `cleanup`: drop file entries already covered by a managed directory.
use std::path::PathBuf;

use anyhow::Result;

use super::Context;
use crate::error::DotmanError;
use crate::manifest::Coverage;

/// What a cleanup found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// Original paths of the redundant entries.
    pub redundant: Vec<PathBuf>,
    /// Number of managed directories in the manifest.
    pub directories: usize,
    /// Whether the entries were actually removed.
    pub applied: bool,
}

/// Run the cleanup command.
///
/// # Errors
///
/// See [`cleanup`].
pub fn run(ctx: &Context) -> Result<()> {
    cleanup(ctx)?;
    Ok(())
}

/// Commit message for a cleanup removing `removed` entries.
#[must_use]
pub fn commit_message(removed: usize, directories: usize) -> String {
    let noun = if directories == 1 {
        "directory"
    } else {
        "directories"
    };
    format!("Cleanup: remove {removed} redundant entries covered by {directories} {noun}")
}

/// Remove every file entry that lies inside a managed directory.
///
/// # Errors
///
/// Returns an error if the store is missing or the manifest cannot be read,
/// saved or committed.
pub fn cleanup(ctx: &Context) -> Result<CleanupReport, DotmanError> {
    ctx.require_store()?;
    let mut manifest = ctx.load_manifest()?;
    let mut report = CleanupReport::default();
    if manifest.is_empty() {
        ctx.log.info("No files are managed by dotman.");
        return Ok(report);
    }

    report.directories = Coverage::new(&manifest).directory_count();
    if report.directories == 0 {
        ctx.log
            .info("No managed directories found - nothing to clean up.");
        return Ok(report);
    }

    let covered = manifest.covered_files();
    if covered.is_empty() {
        ctx.log.info("No redundant file entries found.");
        return Ok(report);
    }

    ctx.log.stage(&format!(
        "Found {} redundant file entr{}",
        covered.len(),
        if covered.len() == 1 { "y" } else { "ies" }
    ));
    for (entry, dir) in &covered {
        ctx.log.info(&format!(
            "  {} (covered by {})",
            entry.original_path.display(),
            dir.display()
        ));
    }
    report.redundant = covered
        .iter()
        .map(|(entry, _)| entry.original_path.clone())
        .collect();

    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would remove {} entries from the index",
            report.redundant.len()
        ));
        return Ok(report);
    }

    let removed = manifest.remove_all(&report.redundant);
    ctx.save_manifest(&manifest)?;
    ctx.commit(&commit_message(removed, report.directories))?;
    ctx.log.info(&format!("removed {removed} redundant entries"));
    report.applied = true;
    Ok(report)
}
