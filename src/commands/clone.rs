//! `clone`: fetch an existing store from a remote.
use std::fs;

use anyhow::Result;

use super::Context;
use crate::cli::CloneOpts;
use crate::error::{CommandError, DotmanError};
use crate::manifest::Manifest;

/// Run the clone command.
///
/// # Errors
///
/// See [`clone_store`].
pub fn run(ctx: &Context, opts: &CloneOpts) -> Result<()> {
    clone_store(ctx, &opts.url)?;
    Ok(())
}

/// Clone `url` into the store and check it holds a readable manifest.
///
/// A clone without a valid manifest is deleted again.
///
/// # Errors
///
/// Returns [`CommandError::StoreExists`] if the store is already present,
/// a git error if the clone fails, or [`CommandError::InvalidClone`] when
/// the result is not a dotman store.
pub fn clone_store(ctx: &Context, url: &str) -> Result<Option<Manifest>, DotmanError> {
    let store = &ctx.config.store_dir;
    if store.symlink_metadata().is_ok() {
        return Err(CommandError::StoreExists(store.clone()).into());
    }

    if ctx.dry_run {
        ctx.log
            .dry_run(&format!("would clone {url} into {}", store.display()));
        return Ok(None);
    }

    ctx.log.stage(&format!("Cloning dotfiles repository from {url}"));
    ctx.vcs.clone_repo(url)?;

    let reason = if ctx.config.manifest_exists() {
        match ctx.load_manifest() {
            Ok(manifest) => {
                ctx.log.info(&format!(
                    "cloned {} managed path(s) into {}",
                    manifest.len(),
                    store.display()
                ));
                ctx.log.info("run 'dotman deploy' to create the symlinks");
                ctx.log
                    .info("or 'dotman sync' to index files that are not yet in the manifest");
                return Ok(Some(manifest));
            }
            Err(e) => e.to_string(),
        }
    } else {
        "index.json not found".to_string()
    };

    if let Err(e) = fs::remove_dir_all(store) {
        ctx.log.warn(&format!(
            "could not remove invalid clone at {}: {e}",
            store.display()
        ));
    }
    Err(CommandError::InvalidClone(reason).into())
}
