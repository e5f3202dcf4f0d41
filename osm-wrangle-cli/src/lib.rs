//! Command-line interface for the OSM wrangling pipeline.
//!
//! Four subcommands cover the offline workflow: `process` streams an XML
//! extract into CSV files, `load` bulk loads those files into SQLite,
//! `audit` reports on a raw extract, and `stats` summarises a loaded
//! database. Each prints its report to stdout as pretty JSON.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use serde::Serialize;

mod audit;
mod error;
mod load;
mod process;
mod stats;

pub use error::CliError;

use audit::AuditArgs;
use load::LoadArgs;
use process::ProcessArgs;
use stats::StatsArgs;

const ARG_OSM_XML: &str = "osm-xml";
const ARG_OUTPUT_DIR: &str = "output-dir";
const ARG_VALIDATE: &str = "validate";
const ARG_CSV_DIR: &str = "csv-dir";
const ARG_DATABASE: &str = "database";
const ARG_LIMIT: &str = "limit";
const ENV_PROCESS_OSM_XML: &str = "OSM_WRANGLE_CMDS_PROCESS_OSM_XML";
const ENV_AUDIT_OSM_XML: &str = "OSM_WRANGLE_CMDS_AUDIT_OSM_XML";

const DEFAULT_DATABASE: &str = "osm.db";

/// Run the CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Process(args) => process::run_process_with(args, &mut stdout),
        Command::Load(args) => load::run_load_with(args, &mut stdout),
        Command::Audit(args) => audit::run_audit_with(args, &mut stdout),
        Command::Stats(args) => stats::run_stats_with(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "osm-wrangle",
    about = "Clean OpenStreetMap XML extracts into CSV files and SQLite tables",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stream an XML extract into the five CSV files.
    Process(ProcessArgs),
    /// Bulk load the CSV files into a SQLite database.
    Load(LoadArgs),
    /// Report tag keys, street types, cities and postcodes of a raw extract.
    Audit(AuditArgs),
    /// Summarise a loaded SQLite database.
    Stats(StatsArgs),
}

/// Check that `path` names an existing regular file.
fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match osm_wrangle_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_report<T: Serialize>(
    writer: &mut dyn Write,
    report: &'static str,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|source| CliError::SerialiseReport { report, source })?;
    writer
        .write_all(payload.as_bytes())
        .and_then(|()| writer.write_all(b"\n"))
        .map_err(|source| CliError::WriteReport { report, source })
}

#[cfg(test)]
mod tests;
