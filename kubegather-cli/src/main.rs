//! Main entry point for the kubegather CLI.
//!
//! Commands:
//! - `get`: Fetch one kubeconfig and merge it into the destination
//! - `gather`: Merge every catalog source
//! - `delete`: Remove a context from the destination
//! - `list`: Relate catalog labels to destination contexts
//! - `completions`: Generate shell completions

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    let _level = kubegather::init_logger(cli.verbose, cli.quiet);

    let global = GlobalOptions {
        quiet: cli.quiet,
        config: cli.config,
        persistent: cli.persistent,
        identity: cli.identity,
        no_backup: cli.no_backup,
    };

    let result = match cli.command {
        cli::Command::Get(cmd) => cmd.execute(&global),
        cli::Command::Gather(cmd) => cmd.execute(&global),
        cli::Command::Delete(cmd) => cmd.execute(&global),
        cli::Command::List(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
