//! `init`: create the store, its repository and an empty manifest.
use std::fs;

use anyhow::Result;

use super::Context;
use crate::error::{CommandError, DotmanError, FsError};
use crate::manifest::Manifest;

/// Initial commit message of a store created by `init`.
pub const INIT_COMMIT_MESSAGE: &str = "Initialize dotman repository with empty index";

/// What `init` found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The store was already a repository.
    AlreadyInitialized,
    /// The store had a manifest but no repository; one was created.
    RepositoryCreated,
    /// A new store was created.
    Created,
}

/// Run the init command.
///
/// # Errors
///
/// See [`init`].
pub fn run(ctx: &Context) -> Result<()> {
    init(ctx)?;
    Ok(())
}

/// Initialize the store.
///
/// # Errors
///
/// Returns [`CommandError::NotAStore`] when the store directory exists with
/// neither a repository nor a manifest, or an error when any creation step
/// fails.
pub fn init(ctx: &Context) -> Result<InitOutcome, DotmanError> {
    let store = &ctx.config.store_dir;

    if ctx.config.store_exists() {
        if ctx.vcs.is_repo() {
            ctx.log.info(&format!(
                "dotman already initialized at {}",
                store.display()
            ));
            return Ok(InitOutcome::AlreadyInitialized);
        }
        if !ctx.config.manifest_exists() {
            return Err(CommandError::NotAStore(store.clone()).into());
        }
        if ctx.dry_run {
            ctx.log.dry_run(&format!(
                "would initialize git repository in {}",
                store.display()
            ));
        } else {
            ctx.log.info("initializing git repository in existing dotman directory");
            ctx.vcs.ensure_repo()?;
        }
        return Ok(InitOutcome::RepositoryCreated);
    }

    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would create dotman repository in {}",
            store.display()
        ));
        return Ok(InitOutcome::Created);
    }

    fs::create_dir_all(store).map_err(FsError::io("create directory", store))?;
    ctx.vcs.ensure_repo()?;
    ctx.save_manifest(&Manifest::new())?;
    ctx.commit(INIT_COMMIT_MESSAGE)?;

    ctx.log
        .info(&format!("initialized dotman repository in {}", store.display()));
    Ok(InitOutcome::Created)
}
