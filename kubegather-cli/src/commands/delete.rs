//! Delete command implementation.
//!
//! The argument names a destination context exactly. With `--persistent`
//! the same name is removed from the catalog first; a missing label there
//! is reported and ignored.

use clap::Args;
use kubegather::{delete_context, read_document, write_document};

use crate::error::CliError;
use crate::utils::{load_catalog, GlobalOptions};

/// Delete a context from the destination.
#[derive(Args)]
pub struct DeleteCommand {
    /// Exact context name (also the catalog label with --persistent)
    #[arg(value_name = "CONTEXT")]
    pub context: String,
}

impl DeleteCommand {
    /// Execute the delete command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut catalog = load_catalog(global)?;

        if global.persistent {
            if let Err(e) = catalog.delete(&self.context) {
                log::error!("{e}, continuing");
            }
            catalog.save()?;
        }

        let destination = catalog.destination_path()?;
        let mut document = read_document(&destination)?;
        let outcome = delete_context(&mut document, &self.context)?;
        write_document(&document, &destination, global.write_options())?;

        if outcome.cleared_current {
            log::warn!("{} was the current context, which is now unset", outcome.context);
        }
        if !global.quiet {
            println!("Deleted {}", outcome.context);
        }
        Ok(())
    }
}
