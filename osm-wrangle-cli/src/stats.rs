//! `stats` command: summarise a loaded database.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use osm_wrangle_data::{DatasetStatistics, dataset_statistics_from_path};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATABASE, ARG_LIMIT, CliError, DEFAULT_DATABASE, require_existing, write_report};

const DEFAULT_LIMIT: usize = 10;

/// CLI arguments for the `stats` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "stats",
    long_about = "Query a database produced by `load` for element counts, \
                 contributor activity and the most frequent postcodes, \
                 cities and amenities.",
    about = "Summarise a loaded SQLite database"
)]
#[ortho_config(prefix = "OSM_WRANGLE")]
pub(crate) struct StatsArgs {
    /// SQLite database produced by `load`.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Number of entries in each ranking.
    #[arg(long = ARG_LIMIT, value_name = "n")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

impl StatsArgs {
    pub(crate) fn into_config(self) -> Result<StatsConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(StatsConfig::from(merged))
    }
}

/// Resolved `stats` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatsConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) limit: usize,
}

impl From<StatsArgs> for StatsConfig {
    fn from(args: StatsArgs) -> Self {
        Self {
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            limit: args.limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}

pub(crate) fn run_stats_with(args: StatsArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let statistics = execute_stats(args)?;
    write_report(writer, "stats", &statistics)
}

fn execute_stats(args: StatsArgs) -> Result<DatasetStatistics, CliError> {
    let config = args.into_config()?;
    require_existing(&config.database, ARG_DATABASE)?;
    dataset_statistics_from_path(&config.database, config.limit)
        .map_err(|err| CliError::Stats(Box::new(err)))
}
