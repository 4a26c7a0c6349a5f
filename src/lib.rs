//! Dotfiles manager.
//!
//! Moves configuration files from the home directory into a git-tracked
//! store (`~/.dotman` by default), replaces them with symlinks and records
//! every managed path in the store's `index.json`.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: home and store resolution, path validation, settings
//! - **[`manifest`]**: the `index.json` model and directory coverage
//! - **[`resources`]**: filesystem primitives and the managed-symlink resource
//! - **[`vcs`]**: the version-control trait and its `git` subprocess backend
//! - **[`commands`]**: subcommand orchestration (`add`, `deploy`, `status`, ...)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod manifest;
pub mod resources;
pub mod vcs;
