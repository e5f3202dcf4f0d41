//! `load` command: bulk load the CSV files into SQLite.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use osm_wrangle_data::{LoadSummary, OutputPaths, load_csv_into_sqlite};
use serde::{Deserialize, Serialize};

use crate::{ARG_CSV_DIR, ARG_DATABASE, CliError, DEFAULT_DATABASE, require_existing, write_report};

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "load",
    long_about = "Replace the nodes, nodes_tags, ways, ways_nodes and \
                 ways_tags tables of a SQLite database with the rows of the \
                 matching CSV files. The database is created when absent.",
    about = "Load the CSV files into SQLite"
)]
#[ortho_config(prefix = "OSM_WRANGLE")]
pub(crate) struct LoadArgs {
    /// Directory holding the five CSV files.
    #[arg(long = ARG_CSV_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) csv_dir: Option<Utf8PathBuf>,
    /// SQLite database to create or update.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl LoadArgs {
    pub(crate) fn into_config(self) -> Result<LoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(LoadConfig::from(merged))
    }
}

/// Resolved `load` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadConfig {
    pub(crate) csv: OutputPaths,
    pub(crate) database: Utf8PathBuf,
}

impl LoadConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        self.csv
            .iter()
            .try_for_each(|(_, path)| require_existing(path, ARG_CSV_DIR))
    }
}

impl From<LoadArgs> for LoadConfig {
    fn from(args: LoadArgs) -> Self {
        let csv_dir = args.csv_dir.unwrap_or_else(|| Utf8PathBuf::from("."));
        Self {
            csv: OutputPaths::in_dir(&csv_dir),
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
        }
    }
}

pub(crate) fn run_load_with(args: LoadArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let summary = execute_load(args)?;
    write_report(writer, "load", &summary)
}

fn execute_load(args: LoadArgs) -> Result<LoadSummary, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    load_csv_into_sqlite(&config.database, &config.csv)
        .map_err(|err| CliError::Load(Box::new(err)))
}
