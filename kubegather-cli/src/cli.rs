//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    CompletionsCommand, DeleteCommand, GatherCommand, GetCommand, ListCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gather kubeconfig contexts from many machines into one file.
#[derive(Parser)]
#[command(name = "kubegather")]
#[command(version, about = "Gather kubeconfig contexts into a single file", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Catalog file (default: ~/.kubegather.yaml, or ./.kubegather.yaml)
    #[arg(long, value_name = "PATH", global = true, env = "KUBEGATHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Record fetched sources in the catalog, and remove deleted labels
    #[arg(short, long, global = true, env = "KUBEGATHER_PERSISTENT")]
    pub persistent: bool,

    /// Private key for every ssh source (overrides ~/.ssh/config)
    #[arg(short = 'I', long, value_name = "PATH", global = true)]
    pub identity: Option<PathBuf>,

    /// Do not keep a timestamped backup of the destination
    #[arg(long, global = true)]
    pub no_backup: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Fetch one kubeconfig and merge its current context
    Get(GetCommand),

    /// Merge every source in the catalog
    Gather(GatherCommand),

    /// Delete a context (and with --persistent, its catalog label)
    Delete(DeleteCommand),

    /// Show catalog labels next to the contexts in the destination
    List(ListCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
