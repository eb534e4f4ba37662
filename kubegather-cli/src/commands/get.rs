//! Get command implementation.
//!
//! Fetches a single kubeconfig, merges its current context into the
//! destination and, with `--persistent`, records the source in the catalog.

use clap::Args;
use kubegather::{default_label, get_source, SourceDefinition};

use crate::error::CliError;
use crate::utils::{build_fetcher, load_catalog, shorten_path, GlobalOptions};

/// Fetch one kubeconfig and merge its current context.
#[derive(Args)]
pub struct GetCommand {
    /// Where to read from: a path, file:// URI, or [ssh://][user@]host[:port][/path]
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Label appended to the merged names (default: the remote host)
    #[arg(short, long)]
    pub label: Option<String>,

    /// Replace the cluster server with this address
    #[arg(short = 'a', long, value_name = "ADDRESS")]
    pub api_address: Option<String>,

    /// Drop CA material and skip TLS verification
    #[arg(short, long)]
    pub insecure: bool,

    /// Point the server at the host the file was fetched from (implies --insecure)
    #[arg(short, long)]
    pub rewrite_api: bool,

    /// Port to use with --rewrite-api instead of the server's own
    #[arg(long, value_name = "PORT")]
    pub override_port: Option<String>,
}

impl GetCommand {
    /// Build the source definition described by the flags.
    fn source_definition(&self) -> Result<SourceDefinition, CliError> {
        if self
            .api_address
            .as_deref()
            .is_some_and(|address| address.trim().is_empty())
        {
            return Err(CliError::InvalidArguments(
                "--api-address must not be empty".to_string(),
            ));
        }
        if self.rewrite_api && self.api_address.is_some() {
            return Err(CliError::InvalidArguments(
                "--api-address cannot be combined with --rewrite-api".to_string(),
            ));
        }
        if self.override_port.is_some() && !self.rewrite_api {
            return Err(CliError::InvalidArguments(
                "--override-port requires --rewrite-api".to_string(),
            ));
        }

        let mut source = SourceDefinition::new(self.source.clone()).with_insecure(self.insecure);
        if let Some(address) = &self.api_address {
            source = source.with_explicit_address(address.clone());
        }
        if self.rewrite_api {
            if !self.insecure {
                log::warn!("--rewrite-api implies --insecure");
            }
            source = source.with_insecure(true).with_autodetect(true);
        }
        if let Some(port) = &self.override_port {
            source = source.with_override_port(port.clone());
        }
        source.validate()?;
        Ok(source)
    }

    /// Execute the get command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let source = self.source_definition()?;
        let label = match self.label {
            Some(label) => label,
            None => default_label(&source)?,
        };

        let mut catalog = load_catalog(global)?;
        let destination = catalog.destination_path()?;
        let fetcher = build_fetcher(global)?;

        let outcome = get_source(
            &fetcher,
            &destination,
            &label,
            &source,
            global.write_options(),
        )?;

        if global.persistent {
            catalog.add(&label, source)?;
            log::info!("saved {label} to {}", catalog.path().display());
        }

        if !global.quiet {
            println!(
                "Merged {} into {}",
                outcome.context,
                shorten_path(&destination)
            );
        }
        Ok(())
    }
}
