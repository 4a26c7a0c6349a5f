//! Subcommand orchestration.
//!
//! Every command receives a [`Context`] holding the resolved [`Config`], the
//! logger, the dry-run flag and the version-control backend. Commands that
//! take several paths run them through [`run_batch`], which keeps going after
//! a failure and records each path for the end-of-run summary.
pub mod add;
pub mod cleanup;
pub mod clone;
pub mod deploy;
pub mod fix;
pub mod init;
pub mod remote;
pub mod remove;
pub mod status;
pub mod sync;

use std::fs;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::CommandFactory;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::config::Config;
use crate::error::{CommandError, DotmanError, FsError, GitError, ManifestError};
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger, PathStatus};
use crate::manifest::Manifest;
use crate::vcs::{CommitOutcome, Git, VersionControl};

/// Shared state for one command invocation.
pub struct Context {
    /// Resolved locations and settings.
    pub config: Config,
    /// Logger for output and per-path recording.
    pub log: Arc<dyn Log>,
    /// Preview changes without applying them.
    pub dry_run: bool,
    /// Version-control backend for the store.
    pub vcs: Arc<dyn VersionControl>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("vcs", &"<dyn VersionControl>")
            .finish()
    }
}

impl Context {
    /// Resolve the config and wire up the system `git`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be resolved or `git` is not
    /// installed.
    pub fn setup(global: &GlobalOpts, log: Arc<dyn Log>) -> Result<Self> {
        let config = Config::resolve(global.home.as_deref(), global.store.as_deref())
            .context("failed to resolve configuration")?;
        log.debug(&format!("home: {}", config.home.display()));
        log.debug(&format!("store: {}", config.store_dir.display()));

        let git = Git::new(
            config.store_dir.clone(),
            config.default_branch.clone(),
            Arc::new(SystemExecutor),
        );
        if !git.is_available() {
            return Err(GitError::NotInstalled.into());
        }

        Ok(Self {
            config,
            log,
            dry_run: global.dry_run,
            vcs: Arc::new(git),
        })
    }

    /// Fail unless the store directory exists.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::StoreMissing`].
    pub fn require_store(&self) -> Result<(), CommandError> {
        if self.config.store_exists() {
            Ok(())
        } else {
            Err(CommandError::StoreMissing(self.config.store_dir.clone()))
        }
    }

    /// Fail unless the store exists and is a repository.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::StoreMissing`] or
    /// [`CommandError::NotARepository`].
    pub fn require_repo(&self) -> Result<(), CommandError> {
        self.require_store()?;
        if self.vcs.is_repo() {
            Ok(())
        } else {
            Err(CommandError::NotARepository(self.config.store_dir.clone()))
        }
    }

    /// Create the store, its repository and an empty manifest if any of them
    /// is missing. Under dry-run only reports what would be created.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory, the repository or the manifest
    /// cannot be created.
    pub fn ensure_store(&self) -> Result<(), DotmanError> {
        if self.config.store_exists() && self.vcs.is_repo() && self.config.manifest_exists() {
            return Ok(());
        }
        let store = &self.config.store_dir;
        if self.dry_run {
            self.log
                .dry_run(&format!("would initialize dotman store at {}", store.display()));
            return Ok(());
        }

        fs::create_dir_all(store).map_err(FsError::io("create directory", store))?;
        if self.vcs.ensure_repo()? {
            self.log
                .info(&format!("initialized git repository in {}", store.display()));
        }
        if !self.config.manifest_exists() {
            Manifest::new().save(&self.config.manifest_file)?;
        }
        Ok(())
    }

    /// Load the manifest from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest exists but cannot be read or parsed.
    pub fn load_manifest(&self) -> Result<Manifest, ManifestError> {
        Manifest::load(&self.config.manifest_file)
    }

    /// Write `manifest` back to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be written.
    pub fn save_manifest(&self, manifest: &Manifest) -> Result<(), ManifestError> {
        manifest.save(&self.config.manifest_file)
    }

    /// Stage everything in the store and commit it with `message`.
    ///
    /// A clean working tree is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or committing fails.
    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        self.vcs.add_all()?;
        match self.vcs.commit(message)? {
            CommitOutcome::Committed => self.log.debug(&format!("committed: {message}")),
            CommitOutcome::NothingToCommit => self.log.debug("nothing to commit"),
        }
        Ok(())
    }

    /// Render `path` for messages as `$HOME/<rel>`.
    #[must_use]
    pub fn display(&self, path: &std::path::Path) -> String {
        self.config.home_display(path)
    }
}

/// Per-path results of a batch command.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Paths that completed (or would complete under dry-run).
    pub succeeded: Vec<String>,
    /// Paths that failed, with their error.
    pub failed: Vec<(String, DotmanError)>,
}

impl BatchReport {
    /// Total number of paths attempted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Turn the report into the command result.
    ///
    /// A batch succeeds while at least one path succeeded. A single failed
    /// path surfaces its own error.
    ///
    /// # Errors
    ///
    /// Returns the lone error of a one-path batch, or
    /// [`CommandError::AllFailed`] when every path of a larger batch failed.
    pub fn finish(self) -> Result<Self> {
        if self.failed.is_empty() || !self.succeeded.is_empty() {
            return Ok(self);
        }
        let count = self.failed.len();
        if count == 1
            && let Some((_, err)) = self.failed.into_iter().next()
        {
            return Err(err.into());
        }
        Err(CommandError::AllFailed { count }.into())
    }
}

/// Run `op` for every raw path, recording each outcome.
///
/// # Errors
///
/// See [`BatchReport::finish`].
pub fn run_batch<F>(ctx: &Context, paths: &[String], mut op: F) -> Result<BatchReport>
where
    F: FnMut(&Context, &str) -> Result<(), DotmanError>,
{
    let mut report = BatchReport::default();
    for raw in paths {
        match op(ctx, raw) {
            Ok(()) => {
                let status = if ctx.dry_run {
                    PathStatus::DryRun
                } else {
                    PathStatus::Ok
                };
                ctx.log.record(raw, status, None);
                report.succeeded.push(raw.clone());
            }
            Err(e) => {
                ctx.log.error(&format!("{raw}: {e}"));
                let message = e.to_string();
                ctx.log.record(raw, PathStatus::Failed, Some(&message));
                report.failed.push((raw.clone(), e));
            }
        }
    }

    if !report.failed.is_empty() && !report.succeeded.is_empty() {
        ctx.log.warn(&format!(
            "completed with {} success(es) and {} failure(s)",
            report.succeeded.len(),
            report.failed.len()
        ));
    }
    report.finish()
}

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Returns the error of the command that ran.
pub fn run(cli: Cli, log: &Arc<Logger>) -> Result<()> {
    let command = cli.command;
    if let Command::Completions(opts) = &command {
        clap_complete::generate(opts.shell, &mut Cli::command(), "dotman", &mut std::io::stdout());
        return Ok(());
    }

    let ctx = Context::setup(&cli.global, Arc::clone(log) as Arc<dyn Log>)?;
    if ctx.dry_run {
        log.debug("dry run: no changes will be made");
    }

    let result = match command {
        Command::Init => init::run(&ctx),
        Command::Clone(opts) => clone::run(&ctx, &opts),
        Command::Add(opts) => add::run(&ctx, &opts),
        Command::Remove(opts) => remove::run(&ctx, &opts),
        Command::Deploy(opts) => deploy::run(&ctx, &opts),
        Command::Status(opts) => status::run(&ctx, &opts),
        Command::Sync(opts) => sync::run(&ctx, &opts),
        Command::Fix => fix::run(&ctx),
        Command::Cleanup => cleanup::run(&ctx),
        Command::Remote(opts) => remote::run(&ctx, &opts),
        Command::Completions(_) | Command::Version => Ok(()),
    };

    log.print_summary();
    result
}

/// Shared helpers for command unit tests.
#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::must_use_candidate,
    clippy::new_without_default
)]
pub mod test_helpers {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use crate::config::Config;
    use crate::error::GitError;
    use crate::logging::{Log, PathEntry, PathStatus};
    use crate::manifest::Manifest;
    use crate::vcs::{CommitOutcome, GITIGNORE, RemoteChange, StatusLine, VersionControl};

    use super::Context;

    /// Log implementation that keeps every message in memory.
    #[derive(Debug, Default)]
    pub struct RecordingLog {
        messages: Mutex<Vec<String>>,
        records: Mutex<Vec<PathEntry>>,
    }

    impl RecordingLog {
        fn push(&self, level: &str, msg: &str) {
            self.messages.lock().unwrap().push(format!("{level}: {msg}"));
        }

        /// Every message, prefixed with its level.
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }

        /// Whether any message contains `needle`.
        pub fn contains(&self, needle: &str) -> bool {
            self.messages().iter().any(|m| m.contains(needle))
        }

        /// Recorded per-path results.
        pub fn records(&self) -> Vec<PathEntry> {
            self.records.lock().unwrap().clone()
        }
    }

    impl Log for RecordingLog {
        fn stage(&self, msg: &str) {
            self.push("stage", msg);
        }
        fn info(&self, msg: &str) {
            self.push("info", msg);
        }
        fn debug(&self, msg: &str) {
            self.push("debug", msg);
        }
        fn warn(&self, msg: &str) {
            self.push("warn", msg);
        }
        fn error(&self, msg: &str) {
            self.push("error", msg);
        }
        fn dry_run(&self, msg: &str) {
            self.push("dry-run", msg);
        }
        fn record(&self, path: &str, status: PathStatus, message: Option<&str>) {
            self.records.lock().unwrap().push(PathEntry {
                path: path.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// In-memory stand-in for git that remembers commits.
    #[derive(Debug, Default)]
    pub struct FakeVcs {
        dir: PathBuf,
        repo: Mutex<bool>,
        commits: Mutex<Vec<String>>,
        remote: Mutex<Option<String>>,
        status: Mutex<Vec<StatusLine>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeVcs {
        /// A fake rooted at `dir`; `repo` says whether it starts initialized.
        pub fn new(dir: &Path, repo: bool) -> Self {
            Self {
                dir: dir.to_path_buf(),
                repo: Mutex::new(repo),
                ..Self::default()
            }
        }

        /// Commit messages in order.
        pub fn commits(&self) -> Vec<String> {
            self.commits.lock().unwrap().clone()
        }

        /// Names of the remote operations that ran.
        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        /// Make `status` report `lines`.
        pub fn set_status(&self, lines: Vec<StatusLine>) {
            *self.status.lock().unwrap() = lines;
        }
    }

    impl VersionControl for FakeVcs {
        fn is_repo(&self) -> bool {
            *self.repo.lock().unwrap()
        }
        fn init(&self) -> Result<(), GitError> {
            *self.repo.lock().unwrap() = true;
            Ok(())
        }
        fn ensure_repo(&self) -> Result<bool, GitError> {
            if self.is_repo() {
                return Ok(false);
            }
            fs::create_dir_all(&self.dir).unwrap();
            fs::write(self.dir.join(".gitignore"), GITIGNORE).unwrap();
            self.init()?;
            self.commits.lock().unwrap().push(crate::vcs::INITIAL_COMMIT_MESSAGE.to_string());
            Ok(true)
        }
        fn add_all(&self) -> Result<(), GitError> {
            Ok(())
        }
        fn commit(&self, message: &str) -> Result<CommitOutcome, GitError> {
            self.commits.lock().unwrap().push(message.to_string());
            Ok(CommitOutcome::Committed)
        }
        fn status(&self) -> Result<Vec<StatusLine>, GitError> {
            Ok(self.status.lock().unwrap().clone())
        }
        fn has_changes(&self) -> Result<bool, GitError> {
            Ok(!self.status.lock().unwrap().is_empty())
        }
        fn remote_url(&self) -> Result<Option<String>, GitError> {
            Ok(self.remote.lock().unwrap().clone())
        }
        fn set_remote(&self, url: &str) -> Result<RemoteChange, GitError> {
            let previous = self.remote.lock().unwrap().replace(url.to_string());
            Ok(if previous.is_some() {
                RemoteChange::Updated
            } else {
                RemoteChange::Added
            })
        }
        fn push(&self) -> Result<(), GitError> {
            self.calls.lock().unwrap().push("push");
            Ok(())
        }
        fn pull(&self) -> Result<(), GitError> {
            self.calls.lock().unwrap().push("pull");
            Ok(())
        }
        fn current_branch(&self) -> Result<String, GitError> {
            Ok("main".to_string())
        }
        fn commit_count(&self) -> Result<u64, GitError> {
            Ok(u64::try_from(self.commits.lock().unwrap().len()).unwrap())
        }
        fn clone_repo(&self, _: &str) -> Result<(), GitError> {
            self.calls.lock().unwrap().push("clone");
            Ok(())
        }
    }

    /// Temporary home with a store under it.
    #[derive(Debug)]
    pub struct TestEnv {
        _tmp: tempfile::TempDir,
        /// Home directory.
        pub home: PathBuf,
        /// Store directory (`<home>/.dotman`).
        pub store: PathBuf,
        /// Captured output.
        pub log: Arc<RecordingLog>,
        /// Fake repository.
        pub vcs: Arc<FakeVcs>,
    }

    impl TestEnv {
        /// A fresh home with no store.
        pub fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let home = dunce::canonicalize(tmp.path()).unwrap();
            let store = home.join(".dotman");
            Self {
                _tmp: tmp,
                vcs: Arc::new(FakeVcs::new(&store, false)),
                log: Arc::new(RecordingLog::default()),
                home,
                store,
            }
        }

        /// A home whose store, repository and empty manifest already exist.
        pub fn initialized() -> Self {
            let env = Self::new();
            fs::create_dir_all(&env.store).unwrap();
            env.vcs.ensure_repo().unwrap();
            Manifest::new().save(&env.store.join("index.json")).unwrap();
            env
        }

        /// Context over this environment.
        pub fn context(&self) -> Context {
            Context {
                config: Config::new(&self.home, &self.store),
                log: self.log.clone(),
                dry_run: false,
                vcs: self.vcs.clone(),
            }
        }

        /// Dry-run context over this environment.
        pub fn dry_run_context(&self) -> Context {
            Context {
                dry_run: true,
                ..self.context()
            }
        }

        /// Write `content` to `rel` under home, creating parents.
        pub fn write_home(&self, rel: &str, content: &str) -> PathBuf {
            write_file(&self.home.join(rel), content)
        }

        /// Write `content` to `rel` under the store, creating parents.
        pub fn write_store(&self, rel: &str, content: &str) -> PathBuf {
            write_file(&self.store.join(rel), content)
        }

        /// Load the manifest from disk.
        pub fn manifest(&self) -> Manifest {
            Manifest::load(&self.store.join("index.json")).unwrap()
        }
    }

    fn write_file(path: &Path, content: &str) -> PathBuf {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        path.to_path_buf()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::test_helpers::TestEnv;
    use super::*;
    use crate::error::PathError;

    fn outside_home() -> DotmanError {
        PathError::OutsideHome {
            path: "/etc/hosts".into(),
        }
        .into()
    }

    #[test]
    fn batch_continues_after_failure() {
        let env = TestEnv::initialized();
        let ctx = env.context();
        let paths = vec!["/etc/hosts".to_string(), "~/.bashrc".to_string()];
        let report = run_batch(&ctx, &paths, |_, raw| {
            if raw.starts_with('/') {
                Err(outside_home())
            } else {
                Ok(())
            }
        })
        .unwrap();

        assert_eq!(report.succeeded, vec!["~/.bashrc".to_string()]);
        assert_eq!(report.failed.len(), 1);
        let records = env.log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, PathStatus::Failed);
        assert_eq!(records[1].status, PathStatus::Ok);
        assert!(env.log.contains("1 success(es) and 1 failure(s)"));
    }

    #[test]
    fn single_failure_surfaces_its_error() {
        let env = TestEnv::initialized();
        let err = run_batch(&env.context(), &["/etc/hosts".to_string()], |_, _| {
            Err(outside_home())
        })
        .unwrap_err();
        assert!(err.to_string().contains("inside home directory"));
    }

    #[test]
    fn all_failed_is_reported_with_count() {
        let env = TestEnv::initialized();
        let paths = vec!["/a".to_string(), "/b".to_string()];
        let err = run_batch(&env.context(), &paths, |_, _| Err(outside_home())).unwrap_err();
        assert_eq!(err.to_string(), "all 2 operation(s) failed");
    }

    #[test]
    fn dry_run_records_dry_run_status() {
        let env = TestEnv::initialized();
        run_batch(&env.dry_run_context(), &["~/.x".to_string()], |_, _| Ok(())).unwrap();
        assert_eq!(env.log.records()[0].status, PathStatus::DryRun);
    }

    #[test]
    fn require_repo_distinguishes_missing_store() {
        let env = TestEnv::new();
        let ctx = env.context();
        assert!(matches!(
            ctx.require_repo(),
            Err(CommandError::StoreMissing(_))
        ));
        fs::create_dir_all(&env.store).unwrap();
        assert!(matches!(
            ctx.require_repo(),
            Err(CommandError::NotARepository(_))
        ));
    }

    #[test]
    fn ensure_store_creates_everything_once() {
        let env = TestEnv::new();
        let ctx = env.context();
        ctx.ensure_store().unwrap();
        assert!(env.store.join("index.json").is_file());
        assert!(env.store.join(".gitignore").is_file());
        ctx.ensure_store().unwrap();
        assert_eq!(env.vcs.commits().len(), 1);
    }

    #[test]
    fn ensure_store_under_dry_run_touches_nothing() {
        let env = TestEnv::new();
        env.dry_run_context().ensure_store().unwrap();
        assert!(!env.store.exists());
        assert!(env.log.contains("would initialize dotman store"));
    }
}
