// Shared helpers for integration tests.
//
// Provides a temporary home directory with a store under it, an in-memory
// version-control backend that records commits, and a log that keeps every
// message so each test can drive commands end to end without touching the
// real home or spawning git.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dotman::commands::Context;
use dotman::config::Config;
use dotman::error::GitError;
use dotman::logging::{Log, PathStatus};
use dotman::manifest::Manifest;
use dotman::vcs::{CommitOutcome, GITIGNORE, RemoteChange, StatusLine, VersionControl};

/// Log that keeps every message in memory.
#[derive(Debug, Default)]
pub struct TestLog {
    messages: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
}

impl TestLog {
    fn push(&self, msg: &str) {
        self.messages.lock().unwrap().push(msg.to_string());
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(needle))
    }

    /// Paths recorded as failed.
    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }
}

impl Log for TestLog {
    fn stage(&self, msg: &str) {
        self.push(msg);
    }
    fn info(&self, msg: &str) {
        self.push(msg);
    }
    fn debug(&self, msg: &str) {
        self.push(msg);
    }
    fn warn(&self, msg: &str) {
        self.push(msg);
    }
    fn error(&self, msg: &str) {
        self.push(msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push(msg);
    }
    fn record(&self, path: &str, status: PathStatus, _: Option<&str>) {
        if status == PathStatus::Failed {
            self.failures.lock().unwrap().push(path.to_string());
        }
    }
}

/// Version-control stand-in that records commits instead of running git.
#[derive(Debug)]
pub struct RecordingVcs {
    dir: PathBuf,
    repo: Mutex<bool>,
    commits: Mutex<Vec<String>>,
}

impl RecordingVcs {
    /// Commit messages in order.
    pub fn commits(&self) -> Vec<String> {
        self.commits.lock().unwrap().clone()
    }

    /// The most recent commit message.
    pub fn last_commit(&self) -> String {
        self.commits().last().cloned().unwrap_or_default()
    }
}

impl VersionControl for RecordingVcs {
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
        Ok(Vec::new())
    }
    fn has_changes(&self) -> Result<bool, GitError> {
        Ok(false)
    }
    fn remote_url(&self) -> Result<Option<String>, GitError> {
        Ok(None)
    }
    fn set_remote(&self, _: &str) -> Result<RemoteChange, GitError> {
        Ok(RemoteChange::Added)
    }
    fn push(&self) -> Result<(), GitError> {
        Err(GitError::NoRemote)
    }
    fn pull(&self) -> Result<(), GitError> {
        Err(GitError::NoRemote)
    }
    fn current_branch(&self) -> Result<String, GitError> {
        Ok("main".to_string())
    }
    fn commit_count(&self) -> Result<u64, GitError> {
        Ok(u64::try_from(self.commits().len()).unwrap())
    }
    fn clone_repo(&self, _: &str) -> Result<(), GitError> {
        Err(GitError::NoRemote)
    }
}

/// An isolated home directory backed by a [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    _root: tempfile::TempDir,
    /// Home directory.
    pub home: PathBuf,
    /// Store directory (`<home>/.dotman`).
    pub store: PathBuf,
    /// Captured output.
    pub log: Arc<TestLog>,
    /// Recorded commits.
    pub vcs: Arc<RecordingVcs>,
}

impl IntegrationTestContext {
    /// A fresh home with no store.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let home = dunce::canonicalize(root.path()).expect("canonicalize temp dir");
        let store = home.join(".dotman");
        Self {
            _root: root,
            vcs: Arc::new(RecordingVcs {
                dir: store.clone(),
                repo: Mutex::new(false),
                commits: Mutex::new(Vec::new()),
            }),
            log: Arc::new(TestLog::default()),
            home,
            store,
        }
    }

    /// Command context over this home.
    pub fn context(&self) -> Context {
        Context {
            config: Config::new(&self.home, &self.store),
            log: self.log.clone(),
            dry_run: false,
            vcs: self.vcs.clone(),
        }
    }

    /// Dry-run command context over this home.
    pub fn dry_run_context(&self) -> Context {
        Context {
            dry_run: true,
            ..self.context()
        }
    }

    /// Absolute path of `rel` under home.
    pub fn home_path(&self, rel: &str) -> PathBuf {
        self.home.join(rel)
    }

    /// Manifest as currently saved.
    pub fn manifest(&self) -> Manifest {
        Manifest::load(&self.store.join("index.json")).expect("load manifest")
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a context over an empty home.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write `content` to `rel` under home.
    pub fn with_home_file(self, rel: &str, content: &str) -> Self {
        write(&self.ctx.home.join(rel), content);
        self
    }

    /// Write `content` to `rel` under the store.
    pub fn with_store_file(self, rel: &str, content: &str) -> Self {
        write(&self.ctx.store.join(rel), content);
        self
    }

    /// Run `init` before handing the context out.
    pub fn initialized(self) -> Self {
        dotman::commands::init::init(&self.ctx.context()).expect("init store");
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

impl From<IntegrationTestContext> for TestContextBuilder {
    /// Continue customising an existing context.
    fn from(ctx: IntegrationTestContext) -> Self {
        Self { ctx }
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    fs::write(path, content).expect("write file");
}
