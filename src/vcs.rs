//! Version-control adapter: the [`VersionControl`] trait and its `git` implementation.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::GitError;
use crate::exec::{ExecResult, Executor};

/// Commit message of the repository's first commit.
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial dotman repository";

/// `.gitignore` written when a repository is created.
pub const GITIGNORE: &str = "\
# Dotman specific ignores
.DS_Store
Thumbs.db
*.tmp
*.swp
*.swo
*~

# Don't ignore the index file
!index.json
";

/// Outcome of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new commit was created.
    Committed,
    /// The index had nothing staged.
    NothingToCommit,
}

/// Outcome of configuring the `origin` remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteChange {
    /// `origin` did not exist and was added.
    Added,
    /// `origin` existed and its URL was replaced.
    Updated,
}

/// One line of `git status --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Two-character status code (e.g. `"??"`, `" M"`).
    pub code: String,
    /// Path relative to the repository root.
    pub path: String,
}

impl StatusLine {
    /// Parse one porcelain line. Returns `None` for lines too short to hold
    /// a code and a path.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let code = line.get(..2)?;
        let path = line.get(3..)?.trim();
        if path.is_empty() {
            return None;
        }
        Some(Self {
            code: code.to_string(),
            path: path.to_string(),
        })
    }

    /// Human-readable label for the status code.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.code.as_str() {
            "??" => "untracked",
            " M" => "modified",
            "M " => "staged",
            " D" => "deleted",
            "D " => "staged for deletion",
            "A " => "added",
            other => other,
        }
    }
}

/// Operations dotman needs from a version-control backend.
#[cfg_attr(test, mockall::automock)]
pub trait VersionControl {
    /// Whether the store is already a repository.
    fn is_repo(&self) -> bool;

    /// Initialize a repository on the default branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn init(&self) -> Result<(), GitError>;

    /// Create the repository with `.gitignore` and an initial commit unless
    /// it already exists. Returns `true` if it was created.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails.
    fn ensure_repo(&self) -> Result<bool, GitError>;

    /// Stage every change in the working tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn add_all(&self) -> Result<(), GitError>;

    /// Commit staged changes with `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails for a reason other than an
    /// empty commit.
    fn commit(&self, message: &str) -> Result<CommitOutcome, GitError>;

    /// Working tree status, one entry per changed path.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn status(&self) -> Result<Vec<StatusLine>, GitError>;

    /// Whether the working tree has uncommitted changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn has_changes(&self) -> Result<bool, GitError>;

    /// URL of `origin`, or `None` when no such remote exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be run.
    fn remote_url(&self) -> Result<Option<String>, GitError>;

    /// Point `origin` at `url`, adding the remote when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn set_remote(&self, url: &str) -> Result<RemoteChange, GitError>;

    /// Push the current branch, setting the upstream on first push.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails.
    fn push(&self) -> Result<(), GitError>;

    /// Pull from the upstream branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull fails.
    fn pull(&self) -> Result<(), GitError>;

    /// Name of the checked-out branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch cannot be determined.
    fn current_branch(&self) -> Result<String, GitError>;

    /// Number of commits reachable from `HEAD` (`0` on an unborn branch).
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be parsed.
    fn commit_count(&self) -> Result<u64, GitError>;

    /// Clone `url` into the store directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone fails.
    fn clone_repo(&self, url: &str) -> Result<(), GitError>;
}

/// [`VersionControl`] backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct Git {
    dir: PathBuf,
    default_branch: String,
    executor: Arc<dyn Executor>,
}

impl Git {
    /// Create an adapter for the repository at `dir`.
    #[must_use]
    pub fn new(dir: PathBuf, default_branch: String, executor: Arc<dyn Executor>) -> Self {
        Self {
            dir,
            default_branch,
            executor,
        }
    }

    /// Repository directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether `git` is on `PATH`.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.executor.which("git")
    }

    fn run_unchecked_in(&self, dir: Option<&Path>, args: &[&str]) -> Result<ExecResult, GitError> {
        self.executor
            .run_unchecked(dir, "git", args)
            .map_err(|source| GitError::Spawn {
                command: args.join(" "),
                source,
            })
    }

    fn run_unchecked(&self, args: &[&str]) -> Result<ExecResult, GitError> {
        self.run_unchecked_in(Some(&self.dir), args)
    }

    fn run(&self, args: &[&str]) -> Result<ExecResult, GitError> {
        let result = self.run_unchecked(args)?;
        check(args, result)
    }
}

fn check(args: &[&str], result: ExecResult) -> Result<ExecResult, GitError> {
    if result.success {
        Ok(result)
    } else {
        Err(GitError::Failed {
            command: args.join(" "),
            code: result.code.unwrap_or(-1),
            output: result.combined(),
        })
    }
}

impl VersionControl for Git {
    fn is_repo(&self) -> bool {
        self.dir.join(".git").exists()
    }

    fn init(&self) -> Result<(), GitError> {
        self.run(&["init", "-b", &self.default_branch])?;
        Ok(())
    }

    fn ensure_repo(&self) -> Result<bool, GitError> {
        if self.is_repo() {
            return Ok(false);
        }
        fs::create_dir_all(&self.dir).map_err(|source| GitError::Io {
            path: self.dir.clone(),
            source,
        })?;
        self.init()?;

        let gitignore = self.dir.join(".gitignore");
        if !gitignore.exists() {
            fs::write(&gitignore, GITIGNORE).map_err(|source| GitError::Io {
                path: gitignore.clone(),
                source,
            })?;
        }

        self.add_all()?;
        self.commit(INITIAL_COMMIT_MESSAGE)?;
        Ok(true)
    }

    fn add_all(&self) -> Result<(), GitError> {
        self.run(&["add", "."])?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<CommitOutcome, GitError> {
        let args = ["commit", "-m", message];
        let result = self.run_unchecked(&args)?;
        match (result.success, result.code) {
            (true, _) => Ok(CommitOutcome::Committed),
            (false, Some(1)) => Ok(CommitOutcome::NothingToCommit),
            _ => check(&args, result).map(|_| CommitOutcome::Committed),
        }
    }

    fn status(&self) -> Result<Vec<StatusLine>, GitError> {
        let result = self.run(&["status", "--porcelain"])?;
        Ok(result.stdout.lines().filter_map(StatusLine::parse).collect())
    }

    fn has_changes(&self) -> Result<bool, GitError> {
        Ok(!self.status()?.is_empty())
    }

    fn remote_url(&self) -> Result<Option<String>, GitError> {
        let result = self.run_unchecked(&["remote", "get-url", "origin"])?;
        let url = result.stdout.trim();
        Ok((result.success && !url.is_empty()).then(|| url.to_string()))
    }

    fn set_remote(&self, url: &str) -> Result<RemoteChange, GitError> {
        if self.remote_url()?.is_some() {
            self.run(&["remote", "set-url", "origin", url])?;
            Ok(RemoteChange::Updated)
        } else {
            self.run(&["remote", "add", "origin", url])?;
            Ok(RemoteChange::Added)
        }
    }

    fn push(&self) -> Result<(), GitError> {
        let args = ["push"];
        let result = self.run_unchecked(&args)?;
        if result.success {
            return Ok(());
        }
        if !result.combined().contains("no upstream branch") {
            return check(&args, result).map(|_| ());
        }
        let branch = self.current_branch()?;
        self.run(&["push", "--set-upstream", "origin", &branch])?;
        Ok(())
    }

    fn pull(&self) -> Result<(), GitError> {
        self.run(&["pull"])?;
        Ok(())
    }

    fn current_branch(&self) -> Result<String, GitError> {
        let result = self.run_unchecked(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if result.success {
            return Ok(result.stdout.trim().to_string());
        }
        // Unborn branch: HEAD exists only as a symbolic ref.
        let result = self.run(&["symbolic-ref", "--short", "HEAD"])?;
        Ok(result.stdout.trim().to_string())
    }

    fn commit_count(&self) -> Result<u64, GitError> {
        let args = ["rev-list", "--count", "HEAD"];
        let result = self.run_unchecked(&args)?;
        if !result.success {
            return Ok(0);
        }
        let out = result.stdout.trim();
        out.parse().map_err(|_| GitError::UnexpectedOutput {
            command: args.join(" "),
            output: out.to_string(),
        })
    }

    fn clone_repo(&self, url: &str) -> Result<(), GitError> {
        let dir = self.dir.to_string_lossy();
        let args = ["clone", url, &dir];
        let result = self.run_unchecked_in(self.dir.parent(), &args)?;
        check(&args, result).map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;

    fn git_with(mock: MockExecutor) -> (Git, Arc<MockExecutor>) {
        let mock = Arc::new(mock);
        let git = Git::new(
            PathBuf::from("/home/u/.dotman"),
            "main".to_string(),
            Arc::clone(&mock) as Arc<dyn Executor>,
        );
        (git, mock)
    }

    // -----------------------------------------------------------------------
    // StatusLine
    // -----------------------------------------------------------------------

    #[test]
    fn parses_porcelain_lines() {
        let line = StatusLine::parse("?? .config/new.toml").unwrap();
        assert_eq!(line.code, "??");
        assert_eq!(line.path, ".config/new.toml");
        assert_eq!(line.label(), "untracked");
        assert_eq!(StatusLine::parse(" M .bashrc").unwrap().label(), "modified");
        assert_eq!(StatusLine::parse("M  .bashrc").unwrap().label(), "staged");
        assert_eq!(StatusLine::parse(" D .vimrc").unwrap().label(), "deleted");
        assert_eq!(
            StatusLine::parse("D  .vimrc").unwrap().label(),
            "staged for deletion"
        );
        assert_eq!(StatusLine::parse("A  index.json").unwrap().label(), "added");
    }

    #[test]
    fn unknown_code_is_its_own_label() {
        assert_eq!(StatusLine::parse("RM a -> b").unwrap().label(), "RM");
    }

    #[test]
    fn short_lines_are_skipped() {
        assert!(StatusLine::parse("").is_none());
        assert!(StatusLine::parse("??").is_none());
        assert!(StatusLine::parse("?? ").is_none());
    }

    // -----------------------------------------------------------------------
    // commands
    // -----------------------------------------------------------------------

    #[test]
    fn init_uses_default_branch() {
        let (git, mock) = git_with(MockExecutor::new().ok(""));
        git.init().unwrap();
        assert_eq!(mock.calls(), vec!["git init -b main"]);
    }

    #[test]
    fn commit_exit_one_is_nothing_to_commit() {
        let (git, _mock) = git_with(MockExecutor::new().fail(1, "nothing to commit"));
        assert_eq!(git.commit("msg").unwrap(), CommitOutcome::NothingToCommit);
    }

    #[test]
    fn commit_other_failure_carries_output() {
        let (git, _mock) = git_with(MockExecutor::new().fail(128, "fatal: not a git repository"));
        let err = git.commit("msg").unwrap_err();
        assert!(err.to_string().contains("fatal: not a git repository"));
    }

    #[test]
    fn status_parses_all_lines() {
        let (git, mock) = git_with(MockExecutor::new().ok("?? a\n M b\n"));
        let lines = git.status().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].path, "b");
        assert_eq!(mock.calls(), vec!["git status --porcelain"]);
    }

    #[test]
    fn clean_tree_has_no_changes() {
        let (git, _mock) = git_with(MockExecutor::new().ok(""));
        assert!(!git.has_changes().unwrap());
    }

    #[test]
    fn missing_remote_is_none() {
        let (git, _mock) = git_with(MockExecutor::new().fail(2, "error: No such remote 'origin'"));
        assert_eq!(git.remote_url().unwrap(), None);
    }

    #[test]
    fn set_remote_adds_when_absent() {
        let (git, mock) = git_with(MockExecutor::new().fail(2, "No such remote").ok(""));
        assert_eq!(git.set_remote("git@host:dots.git").unwrap(), RemoteChange::Added);
        assert_eq!(mock.calls()[1], "git remote add origin git@host:dots.git");
    }

    #[test]
    fn set_remote_updates_existing() {
        let (git, mock) = git_with(MockExecutor::new().ok("git@old:dots.git\n").ok(""));
        assert_eq!(git.set_remote("git@new:dots.git").unwrap(), RemoteChange::Updated);
        assert_eq!(mock.calls()[1], "git remote set-url origin git@new:dots.git");
    }

    #[test]
    fn push_sets_upstream_when_missing() {
        let (git, mock) = git_with(
            MockExecutor::new()
                .fail(128, "fatal: The current branch main has no upstream branch.")
                .ok("main\n")
                .ok(""),
        );
        git.push().unwrap();
        assert_eq!(
            mock.calls(),
            vec![
                "git push",
                "git rev-parse --abbrev-ref HEAD",
                "git push --set-upstream origin main",
            ]
        );
    }

    #[test]
    fn push_other_failure_is_reported() {
        let (git, mock) = git_with(MockExecutor::new().fail(128, "fatal: could not read from remote"));
        let err = git.push().unwrap_err();
        assert!(matches!(err, GitError::Failed { code: 128, .. }));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn current_branch_falls_back_on_unborn_head() {
        let (git, _mock) = git_with(
            MockExecutor::new()
                .fail(128, "fatal: ambiguous argument 'HEAD'")
                .ok("main\n"),
        );
        assert_eq!(git.current_branch().unwrap(), "main");
    }

    #[test]
    fn commit_count_parses_and_defaults_to_zero() {
        let (git, _mock) = git_with(MockExecutor::new().ok("42\n"));
        assert_eq!(git.commit_count().unwrap(), 42);

        let (git, _mock) = git_with(MockExecutor::new().fail(128, "unknown revision"));
        assert_eq!(git.commit_count().unwrap(), 0);

        let (git, _mock) = git_with(MockExecutor::new().ok("lots"));
        assert!(matches!(
            git.commit_count().unwrap_err(),
            GitError::UnexpectedOutput { .. }
        ));
    }

    #[test]
    fn clone_targets_store_dir() {
        let (git, mock) = git_with(MockExecutor::new().ok(""));
        git.clone_repo("https://example.com/dots.git").unwrap();
        assert_eq!(
            mock.calls(),
            vec!["git clone https://example.com/dots.git /home/u/.dotman"]
        );
    }

    #[test]
    fn ensure_repo_writes_gitignore_and_commits() {
        let tmp = tempfile::tempdir().unwrap();
        let store = tmp.path().join(".dotman");
        let mock = Arc::new(MockExecutor::new().ok("").ok("").ok(""));
        let git = Git::new(store.clone(), "main".to_string(), Arc::clone(&mock) as Arc<dyn Executor>);

        assert!(git.ensure_repo().unwrap());

        assert_eq!(fs::read_to_string(store.join(".gitignore")).unwrap(), GITIGNORE);
        assert_eq!(
            mock.calls(),
            vec![
                "git init -b main",
                "git add .",
                "git commit -m Initial dotman repository",
            ]
        );
    }

    #[test]
    fn ensure_repo_is_noop_for_existing_repo() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        let mock = Arc::new(MockExecutor::new());
        let git = Git::new(
            tmp.path().to_path_buf(),
            "main".to_string(),
            Arc::clone(&mock) as Arc<dyn Executor>,
        );
        assert!(!git.ensure_repo().unwrap());
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn spawn_failure_names_command() {
        #[derive(Debug)]
        struct Unspawnable;
        impl Executor for Unspawnable {
            fn run_unchecked(
                &self,
                _: Option<&Path>,
                _: &str,
                _: &[&str],
            ) -> std::io::Result<ExecResult> {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no git"))
            }
            fn which(&self, _: &str) -> bool {
                false
            }
        }
        let git = Git::new(PathBuf::from("/x"), "main".to_string(), Arc::new(Unspawnable));
        assert!(!git.is_available());
        let err = git.pull().unwrap_err();
        assert_eq!(err.to_string(), "failed to run git pull: no git");
    }
}
