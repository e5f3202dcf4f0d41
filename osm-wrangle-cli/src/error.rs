//! Error types emitted by the OSM wrangling CLI.
//!
//! Pipeline errors are boxed so `Result<_, CliError>` stays small under
//! `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use osm_wrangle_data::{LoadError, OsmReadError, PipelineError, StatsError};
use thiserror::Error;

/// Errors emitted by the OSM wrangling CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Long flag name of the missing option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Option naming the path.
        field: &'static str,
        /// Path that was not found.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Option naming the path.
        field: &'static str,
        /// Path that is not a regular file.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Option naming the path.
        field: &'static str,
        /// Path that could not be inspected.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Streaming the extract into CSV files failed.
    #[error("failed to process OSM extract: {0}")]
    Process(#[source] Box<PipelineError>),
    /// Loading the CSV files into SQLite failed.
    #[error("failed to load CSV files: {0}")]
    Load(#[source] Box<LoadError>),
    /// Auditing the extract failed.
    #[error("failed to audit OSM extract: {0}")]
    Audit(#[source] Box<OsmReadError>),
    /// Querying the loaded database failed.
    #[error("failed to compute dataset statistics: {0}")]
    Stats(#[source] Box<StatsError>),
    /// Serialising a report failed.
    #[error("failed to serialise {report} report: {source}")]
    SerialiseReport {
        /// Name of the report being written.
        report: &'static str,
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
    /// Writing a report to the output stream failed.
    #[error("failed to write {report} report: {source}")]
    WriteReport {
        /// Name of the report being written.
        report: &'static str,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
