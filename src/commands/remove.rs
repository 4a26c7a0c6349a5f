//! `remove`: restore managed paths and stop managing them.
use anyhow::Result;

use super::{Context, run_batch};
use crate::cli::RemoveOpts;
use crate::error::{CommandError, DotmanError};
use crate::resources::Resource;
use crate::resources::link::ManagedLink;

/// Run the remove command.
///
/// # Errors
///
/// Returns an error if the store is missing or every path failed.
pub fn run(ctx: &Context, opts: &RemoveOpts) -> Result<()> {
    ctx.require_store()?;
    ctx.log.stage("Removing paths from dotman");
    run_batch(ctx, &opts.paths, remove_path)?;
    Ok(())
}

/// Put the content of one managed path back and drop its entry.
///
/// # Errors
///
/// Fails if the path is not managed, if something other than a symlink is
/// at the original location, or if restoring, saving or committing fails.
pub fn remove_path(ctx: &Context, raw: &str) -> Result<(), DotmanError> {
    let original = ctx.config.expand_path(raw)?;
    let mut manifest = ctx.load_manifest()?;
    let Some(entry) = manifest.find_entry(&original) else {
        return Err(CommandError::NotManaged(original).into());
    };

    let stored = ctx.config.stored_path(&entry.repo_path);
    let display = ctx.display(&original);
    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would restore {} from {}",
            original.display(),
            stored.display()
        ));
        return Ok(());
    }

    ManagedLink::new(stored, original.clone()).remove()?;
    manifest.remove_entry(&original);
    ctx.save_manifest(&manifest)?;
    ctx.commit(&format!("Remove {display} from dotman management"))?;

    ctx.log.info(&format!("removed {display} from dotman management"));
    Ok(())
}
