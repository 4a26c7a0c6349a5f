//! `remote`: show or set the `origin` URL of the store repository.
use anyhow::Result;

use super::Context;
use crate::cli::{RemoteAction, RemoteOpts};
use crate::error::{DotmanError, GitError};
use crate::vcs::RemoteChange;

/// Run the remote command.
///
/// # Errors
///
/// Returns an error if the store is not a repository, no remote is
/// configured (for `get`), or git fails.
pub fn run(ctx: &Context, opts: &RemoteOpts) -> Result<()> {
    match &opts.action {
        RemoteAction::Get => {
            let url = get(ctx)?;
            ctx.log.info(&format!("Remote origin: {url}"));
        }
        RemoteAction::Set { url } => set(ctx, url)?,
    }
    Ok(())
}

/// The configured `origin` URL.
///
/// # Errors
///
/// Returns [`GitError::NoRemote`] when `origin` is not configured.
pub fn get(ctx: &Context) -> Result<String, DotmanError> {
    ctx.require_repo()?;
    ctx.vcs
        .remote_url()?
        .ok_or_else(|| GitError::NoRemote.into())
}

/// Add `origin` or change its URL.
///
/// # Errors
///
/// Returns an error if the store is not a repository or git fails.
pub fn set(ctx: &Context, url: &str) -> Result<(), DotmanError> {
    ctx.require_repo()?;
    if ctx.dry_run {
        ctx.log.dry_run(&format!("would set remote origin to {url}"));
        return Ok(());
    }
    match ctx.vcs.set_remote(url)? {
        RemoteChange::Added => ctx.log.info(&format!("added remote origin: {url}")),
        RemoteChange::Updated => ctx.log.info(&format!("updated remote origin: {url}")),
    }
    Ok(())
}
