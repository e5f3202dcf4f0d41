//! `process` command: stream an extract into CSV files.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use osm_wrangle_core::Shaper;
use osm_wrangle_data::{OutputPaths, ProcessOptions, ProcessSummary, process_osm_file};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_OSM_XML, ARG_OUTPUT_DIR, ARG_VALIDATE, CliError, ENV_PROCESS_OSM_XML, require_existing,
    write_report,
};

/// CLI arguments for the `process` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "process",
    long_about = "Stream the nodes and ways of an OpenStreetMap XML extract \
                 through the cleaners and write nodes.csv, nodes_tags.csv, \
                 ways.csv, ways_nodes.csv and ways_tags.csv into the output \
                 directory.",
    about = "Clean an OSM XML extract into CSV files"
)]
#[ortho_config(prefix = "OSM_WRANGLE")]
pub(crate) struct ProcessArgs {
    /// Path to the OpenStreetMap XML extract.
    #[arg(long = ARG_OSM_XML, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_xml: Option<Utf8PathBuf>,
    /// Directory receiving the CSV files.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Check every shaped element against the record schema.
    #[arg(
        long = ARG_VALIDATE,
        value_name = "bool",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) validate: Option<bool>,
}

impl ProcessArgs {
    pub(crate) fn into_config(self) -> Result<ProcessConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ProcessConfig::try_from(merged)
    }
}

/// Resolved `process` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProcessConfig {
    pub(crate) osm_xml: Utf8PathBuf,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) validate: bool,
}

impl ProcessConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.osm_xml, ARG_OSM_XML)
    }

    pub(crate) fn outputs(&self) -> OutputPaths {
        OutputPaths::in_dir(&self.output_dir)
    }
}

impl TryFrom<ProcessArgs> for ProcessConfig {
    type Error = CliError;

    fn try_from(args: ProcessArgs) -> Result<Self, Self::Error> {
        let osm_xml = args.osm_xml.ok_or(CliError::MissingArgument {
            field: ARG_OSM_XML,
            env: ENV_PROCESS_OSM_XML,
        })?;
        Ok(Self {
            osm_xml,
            output_dir: args.output_dir.unwrap_or_else(|| Utf8PathBuf::from(".")),
            validate: args.validate.unwrap_or(false),
        })
    }
}

pub(crate) fn run_process_with(args: ProcessArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let summary = execute_process(args)?;
    write_report(writer, "process", &summary)
}

fn execute_process(args: ProcessArgs) -> Result<ProcessSummary, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    if config.validate {
        info!("Validating shaped elements against the record schema");
    }
    process_osm_file(
        &config.osm_xml,
        &config.outputs(),
        &Shaper::default(),
        ProcessOptions {
            validate: config.validate,
        },
    )
    .map_err(|err| CliError::Process(Box::new(err)))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ProcessConfig, CliError> {
    let merged = ProcessArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ProcessConfig::try_from(merged)
}
