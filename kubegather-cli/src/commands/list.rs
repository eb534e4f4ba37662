//! List command implementation.
//!
//! Shows each catalog label next to the destination context it produced,
//! followed by contexts no label accounts for, in table, JSON, CSV or TSV
//! form.

use std::io::Write;

use clap::{Args, ValueEnum};
use kubegather::{list, read_document, ListEntry};

use crate::error::CliError;
use crate::utils::{load_catalog, GlobalOptions};

/// Column headers for CSV/TSV output.
const COLUMN_HEADERS: [&str; 4] = ["label", "source", "context", "server"];

/// Show catalog labels next to the contexts in the destination.
#[derive(Args)]
pub struct ListCommand {
    /// Output format
    #[arg(
        long,
        value_enum,
        default_value = "table",
        env = "KUBEGATHER_OUTPUT_FORMAT",
        ignore_case = true
    )]
    pub format: OutputFormat,
}

/// Output format for list command.
#[derive(Clone, Copy, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated table format (human-readable)
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
    /// TSV format (tab-separated values)
    Tsv,
}

impl ListCommand {
    /// Execute the list command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let catalog = load_catalog(global)?;
        let destination = read_document(&catalog.destination_path()?)?;
        let entries = list(&catalog, &destination);

        match self.format {
            OutputFormat::Table => format_as_table(&entries)?,
            OutputFormat::Json => format_as_json(&entries)?,
            OutputFormat::Csv => format_as_delimited(&entries, b',')?,
            OutputFormat::Tsv => format_as_delimited(&entries, b'\t')?,
        }
        Ok(())
    }
}

fn columns(entry: &ListEntry) -> [Option<&str>; 4] {
    [
        entry.label.as_deref(),
        entry.origin.as_deref(),
        entry.context.as_deref(),
        entry.server.as_deref(),
    ]
}

/// Format entries as a human-readable table.
fn format_as_table(entries: &[ListEntry]) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let header_line = COLUMN_HEADERS
        .iter()
        .map(|s| s.to_uppercase())
        .collect::<Vec<_>>()
        .join("\t");
    writeln!(handle, "{header_line}")?;

    for entry in entries {
        let row = columns(entry)
            .iter()
            .map(|c| c.unwrap_or("-"))
            .collect::<Vec<_>>()
            .join("\t");
        writeln!(handle, "{row}")?;
    }
    Ok(())
}

/// Format entries as JSON.
fn format_as_json(entries: &[ListEntry]) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    serde_json::to_writer_pretty(&mut handle, entries)
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    writeln!(handle)?;
    Ok(())
}

/// Convert csv::Error to CliError.
fn csv_error(e: csv::Error) -> CliError {
    CliError::Io(std::io::Error::other(e))
}

/// Format entries as delimited output (CSV or TSV).
fn format_as_delimited(entries: &[ListEntry], delimiter: u8) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let handle = stdout.lock();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(handle);

    writer.write_record(COLUMN_HEADERS).map_err(csv_error)?;
    for entry in entries {
        writer
            .write_record(columns(entry).iter().map(|c| c.unwrap_or("")))
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}
