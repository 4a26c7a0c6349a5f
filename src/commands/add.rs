//! `add`: move paths into the store and leave symlinks behind.
use std::fs;

use anyhow::Result;

use super::{Context, run_batch};
use crate::cli::AddOpts;
use crate::error::{CommandError, DotmanError, FsError, PathError};
use crate::manifest::{Coverage, ManagedEntry};
use crate::resources::fs as rfs;

/// Run the add command.
///
/// # Errors
///
/// Returns an error if every path failed.
pub fn run(ctx: &Context, opts: &AddOpts) -> Result<()> {
    ctx.log.stage("Adding paths to dotman");
    let report = run_batch(ctx, &opts.paths, |ctx, raw| add_path(ctx, raw, opts))?;
    if report.failed.is_empty() && report.succeeded.len() > 1 {
        ctx.log.info(&format!(
            "added {} paths to dotman management",
            report.succeeded.len()
        ));
    }
    Ok(())
}

/// Bring one path under management.
///
/// # Errors
///
/// Fails if the path is outside home, missing, already managed, holds
/// managed paths beneath it, or if any
/// step of move, link, record or commit fails. A failed link moves the
/// content back to where it was.
pub fn add_path(ctx: &Context, raw: &str, opts: &AddOpts) -> Result<(), DotmanError> {
    let config = &ctx.config;
    let original = config.expand_path(raw)?;

    if original == config.home {
        return Err(CommandError::HomeDirectory.into());
    }
    if config.is_inside_store(&original) {
        return Err(CommandError::InsideStore(original).into());
    }
    if original.symlink_metadata().is_err() {
        return Err(CommandError::PathNotFound(original).into());
    }

    ctx.ensure_store()?;

    let mut manifest = ctx.load_manifest()?;
    if manifest.is_managed(&original) {
        return Err(CommandError::AlreadyManaged(original).into());
    }
    if let Some(dir) = Coverage::new(&manifest).covering_dir(&original) {
        return Err(CommandError::CoveredByDirectory {
            dir: dir.to_path_buf(),
            path: original,
        }
        .into());
    }

    let Some(repo_path) = config.relative_to_home(&original) else {
        return Err(PathError::OutsideHome { path: original }.into());
    };
    let nested = manifest
        .entries()
        .iter()
        .filter(|e| e.repo_path.starts_with(&repo_path))
        .count();
    if nested > 0 {
        return Err(CommandError::ContainsManaged {
            path: original,
            count: nested,
        }
        .into());
    }
    let destination = config.stored_path(&repo_path);
    let replace_existing = destination.symlink_metadata().is_ok();
    if replace_existing && !opts.force {
        return Err(CommandError::AlreadyInStore(destination).into());
    }

    let display = ctx.display(&original);
    if ctx.dry_run {
        if replace_existing {
            ctx.log.dry_run(&format!(
                "would replace existing {}",
                destination.display()
            ));
        }
        if opts.backup {
            ctx.log.dry_run(&format!(
                "would back up {} to {}",
                original.display(),
                rfs::backup_path(&original).display()
            ));
        }
        ctx.log.dry_run(&format!(
            "would move {} to {} and link it back",
            original.display(),
            destination.display()
        ));
        return Ok(());
    }

    ctx.log.info(&format!("adding {}", original.display()));
    if replace_existing {
        rfs::remove_path(&destination)?;
        ctx.log
            .debug(&format!("replaced existing {}", destination.display()));
    }
    if opts.backup {
        let backup = rfs::backup(&original)?;
        ctx.log.info(&format!("backed up to {}", backup.display()));
    }

    let kind = rfs::kind_of(&original);
    rfs::move_into_store(&original, &destination)?;
    if let Err(e) = rfs::link(&original, &destination) {
        if let Err(restore) = fs::rename(&destination, &original) {
            ctx.log.error(&format!(
                "could not move {} back: {}",
                destination.display(),
                FsError::io("restore", &original)(restore)
            ));
        }
        return Err(e.into());
    }

    manifest.add_entry(ManagedEntry::new(original, repo_path, kind));
    ctx.save_manifest(&manifest)?;
    ctx.commit(&format!("Add {display} to dotman management"))?;

    ctx.log.info(&format!("added {display} ({kind})"));
    Ok(())
}
