//! Gather command implementation.

use clap::Args;
use kubegather::gather;

use crate::error::CliError;
use crate::utils::{build_fetcher, load_catalog, shorten_path, GlobalOptions};

/// Merge every source in the catalog.
#[derive(Args)]
pub struct GatherCommand {}

impl GatherCommand {
    /// Execute the gather command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let catalog = load_catalog(global)?;
        let fetcher = build_fetcher(global)?;

        let outcomes = gather(&fetcher, &catalog, global.write_options())?;

        if !global.quiet && !outcomes.is_empty() {
            let destination = catalog.destination_path()?;
            for outcome in &outcomes {
                println!(
                    "Merged {} into {}",
                    outcome.context,
                    shorten_path(&destination)
                );
            }
        }
        Ok(())
    }
}
