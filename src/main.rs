//! `dotman` command-line entry point.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use dotman::cli::{Cli, Command};
use dotman::commands;
use dotman::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    if matches!(args.command, Command::Version) {
        let version = option_env!("DOTMAN_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
        #[allow(clippy::print_stdout)]
        {
            println!("dotman {version}");
        }
        return Ok(());
    }

    let name = args.command.name();
    init_subscriber(args.verbose, name);
    let log = Arc::new(Logger::new(name));
    commands::run(args, &log)
}
