//! `audit` command: report on a raw extract.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use osm_wrangle_data::{AuditExpectations, AuditReport, audit_osm_file};
use serde::{Deserialize, Serialize};

use crate::{ARG_OSM_XML, CliError, ENV_AUDIT_OSM_XML, require_existing, write_report};

/// CLI arguments for the `audit` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "audit",
    long_about = "Read an OpenStreetMap XML extract without cleaning it and \
                 report tag key shapes, unexpected street types and city \
                 names, and raw postcode and amenity counts.",
    about = "Audit an OSM XML extract"
)]
#[ortho_config(prefix = "OSM_WRANGLE")]
pub(crate) struct AuditArgs {
    /// Path to the OpenStreetMap XML extract.
    #[arg(long = ARG_OSM_XML, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_xml: Option<Utf8PathBuf>,
}

impl AuditArgs {
    pub(crate) fn into_config(self) -> Result<AuditConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AuditConfig::try_from(merged)
    }
}

/// Resolved `audit` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuditConfig {
    pub(crate) osm_xml: Utf8PathBuf,
}

impl TryFrom<AuditArgs> for AuditConfig {
    type Error = CliError;

    fn try_from(args: AuditArgs) -> Result<Self, Self::Error> {
        let osm_xml = args.osm_xml.ok_or(CliError::MissingArgument {
            field: ARG_OSM_XML,
            env: ENV_AUDIT_OSM_XML,
        })?;
        Ok(Self { osm_xml })
    }
}

pub(crate) fn run_audit_with(args: AuditArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let report = execute_audit(args)?;
    write_report(writer, "audit", &report)
}

fn execute_audit(args: AuditArgs) -> Result<AuditReport, CliError> {
    let config = args.into_config()?;
    require_existing(&config.osm_xml, ARG_OSM_XML)?;
    audit_osm_file(&config.osm_xml, &AuditExpectations::default())
        .map_err(|err| CliError::Audit(Box::new(err)))
}
