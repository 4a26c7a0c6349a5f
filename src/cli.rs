//! Command-line surface.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "dotman",
    about = "Move dotfiles into a git-tracked store and symlink them back",
    version = option_env!("DOTMAN_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Show what would be done without doing it
    #[arg(short = 'd', long, short_alias = 'n', global = true)]
    pub dry_run: bool,

    /// Override the home directory
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Override the store directory (default: ~/.dotman)
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the store, its git repository and an empty index
    Init,
    /// Clone an existing store from a git remote
    Clone(CloneOpts),
    /// Move paths into the store and replace them with symlinks
    Add(AddOpts),
    /// Restore managed paths and stop managing them
    Remove(RemoveOpts),
    /// Create symlinks for every managed path
    Deploy(DeployOpts),
    /// Show the state of managed paths and the repository
    Status(StatusOpts),
    /// Index unmanaged store files, or pull/push the repository
    Sync(SyncOpts),
    /// Repair missing or stale symlinks
    Fix,
    /// Drop file entries already covered by a managed directory
    Cleanup,
    /// Show or set the git remote
    Remote(RemoteOpts),
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Short name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Clone(_) => "clone",
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::Deploy(_) => "deploy",
            Self::Status(_) => "status",
            Self::Sync(_) => "sync",
            Self::Fix => "fix",
            Self::Cleanup => "cleanup",
            Self::Remote(_) => "remote",
            Self::Completions(_) => "completions",
            Self::Version => "version",
        }
    }
}

/// Options for the `clone` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CloneOpts {
    /// Repository URL
    pub url: String,
}

/// Options for the `add` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct AddOpts {
    /// Paths to manage
    #[arg(required = true, num_args = 1..)]
    pub paths: Vec<String>,

    /// Replace a leftover copy already in the store
    #[arg(short, long)]
    pub force: bool,

    /// Copy the original to <path>.backup first
    #[arg(short, long)]
    pub backup: bool,
}

/// Options for the `remove` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RemoveOpts {
    /// Managed paths to restore
    #[arg(required = true, num_args = 1..)]
    pub paths: Vec<String>,
}

/// Options for the `deploy` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct DeployOpts {
    /// Index unmanaged store files before deploying
    #[arg(short, long)]
    pub sync: bool,

    /// Replace symlinks that point somewhere else (real files are never touched)
    #[arg(short, long)]
    pub force: bool,
}

/// Options for the `status` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct StatusOpts {
    /// Fix broken or missing symlinks
    #[arg(short, long)]
    pub fix: bool,

    /// Remove file entries covered by managed directories first
    #[arg(short, long)]
    pub cleanup: bool,

    /// Index unmanaged store files first
    #[arg(short, long)]
    pub sync: bool,
}

/// Options for the `sync` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct SyncOpts {
    /// Pull changes from the git remote
    #[arg(long, conflicts_with = "push")]
    pub pull: bool,

    /// Push local commits to the git remote
    #[arg(long)]
    pub push: bool,

    /// Add discovered files without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Options for the `remote` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RemoteOpts {
    /// Remote action.
    #[command(subcommand)]
    pub action: RemoteAction,
}

/// `remote` actions.
#[derive(Subcommand, Debug, Clone)]
pub enum RemoteAction {
    /// Print the origin URL
    Get,
    /// Set (or add) the origin URL
    Set {
        /// Repository URL
        url: String,
    },
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_add_multiple_paths() {
        let cli = Cli::parse_from(["dotman", "add", "~/.bashrc", "~/.vimrc", "--backup"]);
        let Command::Add(opts) = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(opts.paths, vec!["~/.bashrc", "~/.vimrc"]);
        assert!(opts.backup);
        assert!(!opts.force);
    }

    #[test]
    fn add_requires_a_path() {
        assert!(Cli::try_parse_from(["dotman", "add"]).is_err());
    }

    #[test]
    fn parse_dry_run_short_and_alias() {
        assert!(Cli::parse_from(["dotman", "-d", "deploy"]).global.dry_run);
        assert!(Cli::parse_from(["dotman", "deploy", "-n"]).global.dry_run);
        assert!(Cli::parse_from(["dotman", "--dry-run", "fix"]).global.dry_run);
    }

    #[test]
    fn parse_store_and_home_overrides() {
        let cli = Cli::parse_from([
            "dotman", "--home", "/tmp/h", "status", "--store", "/tmp/s",
        ]);
        assert_eq!(cli.global.home, Some(PathBuf::from("/tmp/h")));
        assert_eq!(cli.global.store, Some(PathBuf::from("/tmp/s")));
    }

    #[test]
    fn parse_status_flags() {
        let cli = Cli::parse_from(["dotman", "status", "--fix", "-c"]);
        let Command::Status(opts) = cli.command else {
            panic!("expected status command");
        };
        assert!(opts.fix);
        assert!(opts.cleanup);
        assert!(!opts.sync);
    }

    #[test]
    fn pull_and_push_conflict() {
        assert!(Cli::try_parse_from(["dotman", "sync", "--pull", "--push"]).is_err());
    }

    #[test]
    fn parse_remote_set() {
        let cli = Cli::parse_from(["dotman", "remote", "set", "git@host:dots.git"]);
        let Command::Remote(RemoteOpts {
            action: RemoteAction::Set { url },
        }) = cli.command
        else {
            panic!("expected remote set");
        };
        assert_eq!(url, "git@host:dots.git");
    }

    #[test]
    fn parse_completions() {
        let cli = Cli::parse_from(["dotman", "completions", "zsh"]);
        assert!(matches!(
            cli.command,
            Command::Completions(CompletionsOpts {
                shell: clap_complete::Shell::Zsh
            })
        ));
    }

    #[test]
    fn command_names() {
        assert_eq!(Cli::parse_from(["dotman", "version"]).command.name(), "version");
        assert_eq!(Cli::parse_from(["dotman", "-v", "init"]).command.name(), "init");
    }
}
