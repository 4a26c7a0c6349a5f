//! `sync`: index store files missing from the manifest, or pull/push.
use std::io;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use dialoguer::Confirm;
use walkdir::WalkDir;

use super::Context;
use crate::cli::SyncOpts;
use crate::config::Config;
use crate::error::{DotmanError, FsError};
use crate::manifest::{Coverage, ManagedEntry, Manifest};
use crate::resources::fs as rfs;

/// Paths listed by name in a sync commit message before it switches to a count.
const MAX_LISTED_PATHS: usize = 3;

/// How discovered files are confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Ask on the terminal before adding.
    Interactive,
    /// The user already agreed (`--yes`).
    Confirmed,
    /// Triggered by another command; add without asking.
    Auto,
}

/// Run the sync command.
///
/// # Errors
///
/// Returns an error if the store is missing, git fails, or discovery fails.
pub fn run(ctx: &Context, opts: &SyncOpts) -> Result<()> {
    if opts.pull {
        return Ok(pull(ctx)?);
    }
    if opts.push {
        return Ok(push(ctx)?);
    }
    ctx.require_store()?;
    let mode = if opts.yes {
        SyncMode::Confirmed
    } else {
        SyncMode::Interactive
    };
    discover(ctx, mode)?;
    Ok(())
}

/// Store-relative paths of content files that no entry accounts for.
///
/// Walks the store (without entering `.git`), skips metadata, skips files
/// that are managed or lie inside a managed directory. Results are sorted.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn find_unmanaged(config: &Config, manifest: &Manifest) -> Result<Vec<PathBuf>, FsError> {
    let coverage = Coverage::new(manifest);
    let mut found = Vec::new();
    let walker = WalkDir::new(&config.store_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == ".git"));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| config.store_dir.clone(), PathBuf::from);
            FsError::io("read", path)(io::Error::from(e))
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&config.store_dir) else {
            continue;
        };
        if config.should_ignore_repo_path(rel) {
            continue;
        }
        let original = config.home.join(rel);
        if manifest.is_managed(&original) || coverage.covers(&original) {
            continue;
        }
        found.push(rel.to_path_buf());
    }
    Ok(found)
}

/// Commit message for entries added by discovery.
#[must_use]
pub fn commit_message(paths: &[String]) -> String {
    match paths {
        [single] => format!("Sync: add {single} to index"),
        _ if paths.len() <= MAX_LISTED_PATHS => {
            format!("Sync: add {} to index", paths.join(", "))
        }
        _ => format!(
            "Sync: add {} files to index ({}, ...)",
            paths.len(),
            paths
                .iter()
                .take(2)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Find unmanaged store files and add them to the manifest.
///
/// Returns the store-relative paths that were added. Nothing is added under
/// dry-run or when the user declines.
///
/// # Errors
///
/// Returns an error if the store cannot be walked, the prompt fails, or
/// saving and committing the manifest fails.
pub fn discover(ctx: &Context, mode: SyncMode) -> Result<Vec<PathBuf>> {
    let mut manifest = ctx.load_manifest()?;
    let unmanaged = find_unmanaged(&ctx.config, &manifest)?;
    if unmanaged.is_empty() {
        ctx.log.info("All repo files are already managed in the index.");
        return Ok(Vec::new());
    }

    ctx.log.stage(&format!(
        "Found {} unmanaged file(s) in repo",
        unmanaged.len()
    ));
    for rel in &unmanaged {
        ctx.log.info(&format!("  {}", rel.display()));
    }

    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would add {} file(s) to the index",
            unmanaged.len()
        ));
        return Ok(Vec::new());
    }

    if mode == SyncMode::Interactive {
        let accepted = Confirm::new()
            .with_prompt("Add these files to the index?")
            .default(false)
            .interact()
            .context("failed to read confirmation")?;
        if !accepted {
            ctx.log.info("Sync cancelled.");
            return Ok(Vec::new());
        }
    }

    let mut added = Vec::new();
    for rel in unmanaged {
        let original = ctx.config.home.join(&rel);
        let kind = rfs::kind_of(&ctx.config.stored_path(&rel));
        if mode != SyncMode::Auto {
            ctx.log.info(&format!("adding {} to index", original.display()));
        }
        manifest.add_entry(ManagedEntry::new(original, rel.clone(), kind));
        added.push(rel);
    }

    ctx.save_manifest(&manifest)?;
    let listed: Vec<String> = added
        .iter()
        .map(|rel| ctx.display(&ctx.config.home.join(rel)))
        .collect();
    ctx.commit(&commit_message(&listed))?;

    let verb = if mode == SyncMode::Auto {
        "auto-synced"
    } else {
        "synced"
    };
    ctx.log.info(&format!("{verb} {} file(s) to index", added.len()));
    Ok(added)
}

/// Pull from the remote.
///
/// # Errors
///
/// Returns an error if the store is not a repository or the pull fails.
pub fn pull(ctx: &Context) -> Result<(), DotmanError> {
    ctx.require_repo()?;
    ctx.log.stage("Pulling changes from git remote");
    if ctx.dry_run {
        ctx.log.dry_run("would pull from origin");
        return Ok(());
    }
    ctx.vcs.pull()?;
    ctx.log.info("Successfully pulled changes from remote");
    Ok(())
}

/// Push to the remote, warning about uncommitted changes first.
///
/// # Errors
///
/// Returns an error if the store is not a repository or the push fails.
pub fn push(ctx: &Context) -> Result<(), DotmanError> {
    ctx.require_repo()?;
    ctx.log.stage("Pushing changes to git remote");
    if ctx.vcs.has_changes()? {
        ctx.log
            .warn("You have uncommitted changes. Commit them first or they won't be pushed.");
    }
    if ctx.dry_run {
        ctx.log.dry_run("would push to origin");
        return Ok(());
    }
    ctx.vcs.push()?;
    ctx.log.info("Successfully pushed changes to remote");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::TestEnv;
    use crate::manifest::EntryKind;
    use crate::vcs::StatusLine;
    use std::path::Path;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| p.display().to_string()).collect()
    }

    #[test]
    fn finds_content_but_not_metadata() {
        let env = TestEnv::initialized();
        env.write_store(".bashrc", "x");
        env.write_store(".gitconfig", "[user]");
        env.write_store("README.md", "docs");
        env.write_store(".git/HEAD", "ref: refs/heads/main");

        let found = find_unmanaged(&env.context().config, &env.manifest()).unwrap();

        assert_eq!(names(&found), vec![".bashrc", ".gitconfig"]);
    }

    #[test]
    fn files_under_managed_directory_are_not_proposed() {
        let env = TestEnv::initialized();
        env.write_store(".config/app/a.json", "{}");
        env.write_store(".config/app/nested/b.json", "{}");
        env.write_store(".config/other.toml", "");
        let mut manifest = env.manifest();
        manifest.add_entry(ManagedEntry::new(
            env.home.join(".config/app"),
            PathBuf::from(".config/app"),
            EntryKind::Directory,
        ));

        let found = find_unmanaged(&env.context().config, &manifest).unwrap();

        assert_eq!(found, vec![PathBuf::from(".config/other.toml")]);
    }

    #[test]
    fn auto_discovery_adds_and_commits() {
        let env = TestEnv::initialized();
        env.write_store(".bashrc", "x");
        env.write_store(".vimrc", "y");

        let added = discover(&env.context(), SyncMode::Auto).unwrap();

        assert_eq!(added.len(), 2);
        let manifest = env.manifest();
        assert!(manifest.is_managed(&env.home.join(".vimrc")));
        assert_eq!(manifest.entries()[0].kind, EntryKind::File);
        assert_eq!(
            env.vcs.commits().last().unwrap(),
            "Sync: add $HOME/.bashrc, $HOME/.vimrc to index"
        );
        assert!(env.log.contains("auto-synced 2 file(s)"));
    }

    #[test]
    fn nothing_to_discover() {
        let env = TestEnv::initialized();
        assert!(discover(&env.context(), SyncMode::Confirmed).unwrap().is_empty());
        assert!(env.log.contains("All repo files are already managed"));
    }

    #[test]
    fn dry_run_lists_without_adding() {
        let env = TestEnv::initialized();
        env.write_store(".bashrc", "x");

        assert!(discover(&env.dry_run_context(), SyncMode::Interactive).unwrap().is_empty());
        assert!(env.manifest().is_empty());
        assert!(env.log.contains(".bashrc"));
    }

    #[test]
    fn commit_message_formats() {
        let p = |n: usize| (1..=n).map(|i| format!("$HOME/f{i}")).collect::<Vec<_>>();
        insta::assert_snapshot!(commit_message(&p(1)), @"Sync: add $HOME/f1 to index");
        insta::assert_snapshot!(commit_message(&p(3)), @"Sync: add $HOME/f1, $HOME/f2, $HOME/f3 to index");
        insta::assert_snapshot!(commit_message(&p(5)), @"Sync: add 5 files to index ($HOME/f1, $HOME/f2, ...)");
    }

    #[test]
    fn push_warns_about_uncommitted_changes() {
        let env = TestEnv::initialized();
        env.vcs.set_status(vec![StatusLine::parse("?? notes.txt").unwrap()]);

        push(&env.context()).unwrap();

        assert!(env.log.contains("You have uncommitted changes"));
        assert_eq!(env.vcs.calls(), vec!["push"]);
    }

    #[test]
    fn pull_and_push_respect_dry_run() {
        let env = TestEnv::initialized();
        let ctx = env.dry_run_context();
        pull(&ctx).unwrap();
        push(&ctx).unwrap();
        assert!(env.vcs.calls().is_empty());
    }

    #[test]
    fn pull_requires_repository() {
        let env = TestEnv::new();
        std::fs::create_dir_all(&env.store).unwrap();
        let err = pull(&env.context()).unwrap_err();
        assert!(err.to_string().contains("not a git repository"));
        assert!(!Path::new(&env.store).join(".git").exists());
    }
}
