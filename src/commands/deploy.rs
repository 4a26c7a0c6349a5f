//! `deploy`: create the symlink of every managed entry.
use anyhow::Result;

use super::Context;
use super::sync::{self, SyncMode};
use crate::cli::DeployOpts;
use crate::error::DotmanError;
use crate::manifest::Coverage;
use crate::resources::link::ManagedLink;
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Counts of what a deploy did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeployReport {
    /// Symlinks created (or that would be under dry-run).
    pub deployed: usize,
    /// Entries left alone: correct links, existing links, metadata.
    pub skipped: usize,
    /// Entries that need attention: missing content, real files in the way.
    pub warned: usize,
    /// Entries whose link could not be created.
    pub failed: usize,
}

/// Run the deploy command.
///
/// # Errors
///
/// Returns an error if the store is missing, the manifest cannot be read,
/// or any symlink could not be created.
pub fn run(ctx: &Context, opts: &DeployOpts) -> Result<()> {
    if opts.sync {
        ctx.require_store()?;
        sync::discover(ctx, SyncMode::Auto)?;
    }
    let report = deploy(ctx, opts.force)?;
    if report.failed > 0 {
        anyhow::bail!("{} symlink(s) could not be created", report.failed);
    }
    Ok(())
}

/// Link every entry that has no symlink yet.
///
/// Real files are never replaced. Symlinks pointing elsewhere are replaced
/// only with `force`.
///
/// # Errors
///
/// Returns an error if the store is missing or the manifest cannot be read.
pub fn deploy(ctx: &Context, force: bool) -> Result<DeployReport, DotmanError> {
    ctx.require_store()?;
    let manifest = ctx.load_manifest()?;
    let mut report = DeployReport::default();
    if manifest.is_empty() {
        ctx.log.info("No files to deploy.");
        return Ok(report);
    }

    ctx.log.stage(&format!("Deploying {} managed path(s)", manifest.len()));
    let coverage = Coverage::new(&manifest);
    for entry in manifest.entries() {
        let original = &entry.original_path;
        if ctx.config.should_ignore_repo_path(&entry.repo_path) {
            ctx.log.info(&format!(
                "skipping repository metadata: {}",
                entry.repo_path.display()
            ));
            report.skipped += 1;
            continue;
        }
        if let Some(dir) = coverage.covering_dir(original) {
            ctx.log.debug(&format!(
                "skipping {} (covered by {})",
                original.display(),
                dir.display()
            ));
            report.skipped += 1;
            continue;
        }

        let link = ManagedLink::new(ctx.config.stored_path(&entry.repo_path), original.clone())
            .with_force(force);
        deploy_entry(ctx, &link, &mut report);
    }

    ctx.log.info(&format!(
        "Deployment complete: {} deployed, {} skipped, {} warning(s)",
        report.deployed, report.skipped, report.warned
    ));
    Ok(report)
}

/// Check one link and create it when that is safe.
fn deploy_entry(ctx: &Context, link: &ManagedLink, report: &mut DeployReport) {
    let original = &link.original;
    let state = match link.current_state() {
        Ok(state) => state,
        Err(e) => {
            ctx.log.error(&e.to_string());
            report.failed += 1;
            return;
        }
    };

    match state {
        ResourceState::Invalid { .. } => {
            ctx.log.warn(&format!(
                "repository file missing for {}: {}",
                original.display(),
                link.stored.display()
            ));
            report.warned += 1;
        }
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {}", original.display()));
            report.skipped += 1;
        }
        ResourceState::Occupied => {
            ctx.log.warn(&format!(
                "{} exists and is not a symlink, skipping",
                original.display()
            ));
            report.warned += 1;
        }
        ResourceState::Stale { .. } | ResourceState::Incorrect { .. } if !link.force => {
            ctx.log.info(&format!(
                "skipping {} (symlink already exists)",
                original.display()
            ));
            report.skipped += 1;
        }
        ResourceState::Missing | ResourceState::Stale { .. } | ResourceState::Incorrect { .. } => {
            if ctx.dry_run {
                ctx.log.dry_run(&format!("would link {}", link.description()));
                report.deployed += 1;
                return;
            }
            match link.apply() {
                Ok(ResourceChange::Applied) => {
                    ctx.log.info(&format!("deployed {}", original.display()));
                    report.deployed += 1;
                }
                Ok(_) => report.skipped += 1,
                Err(e) => {
                    ctx.log.error(&e.to_string());
                    report.failed += 1;
                }
            }
        }
    }
}
