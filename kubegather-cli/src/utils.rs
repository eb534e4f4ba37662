//! Utility functions for CLI operations.
//!
//! Catalog loading, transport construction and display helpers shared by
//! the commands.

use std::path::{Path, PathBuf};

use kubegather::{resolve_config_path, AddressResolver, Catalog, OriginFetcher, WriteOptions};

use crate::error::CliError;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Suppress non-essential output.
    pub quiet: bool,

    /// Explicit catalog file.
    pub config: Option<PathBuf>,

    /// Record sources in, and remove labels from, the catalog.
    pub persistent: bool,

    /// Private key used for every ssh source.
    pub identity: Option<PathBuf>,

    /// Skip the timestamped backup of the destination.
    pub no_backup: bool,
}

impl GlobalOptions {
    /// Write options for the destination document.
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions::default().with_backup(!self.no_backup)
    }
}

/// Load the catalog selected by `--config` or discovery.
pub fn load_catalog(global: &GlobalOptions) -> Result<Catalog, CliError> {
    let path = resolve_config_path(global.config.as_deref())?;
    log::debug!("using catalog {}", path.display());
    Catalog::load(&path).map_err(|e| match e {
        kubegather::Error::Configuration(inner) => {
            CliError::Config(format!("{}: {inner}", path.display()))
        }
        other => CliError::from(other),
    })
}

/// Build the transport used for fetching sources.
pub fn build_fetcher(global: &GlobalOptions) -> Result<OriginFetcher, CliError> {
    let resolver = AddressResolver::from_default_config(global.identity.clone())?;
    Ok(OriginFetcher::new(resolver))
}

/// Shorten a path for display.
///
/// If the path is within the home directory, show it as ~/...
/// Otherwise, show the full path.
pub fn shorten_path(path: &Path) -> String {
    if let Some(home) = home::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}
