//! Input and output adapters for the OSM wrangling pipeline.
//!
//! Responsibilities:
//! - Stream `node` and `way` elements out of OpenStreetMap XML extracts.
//! - Write shaped rows to the five CSV channels.
//! - Load those channels into SQLite and summarise the loaded tables.
//! - Audit raw extracts before cleaning.
//!
//! Boundaries:
//! - Do not encode cleaning or shaping rules (live in `osm-wrangle-core`).
//! - Leave argument parsing and report formatting to the CLI.
//!
//! Invariants:
//! - Memory use is bounded by the largest single element, not the extract.
//! - Rows reach each channel in source document order.
//! - No global mutable state.

mod audit;
mod channels;
mod pipeline;
mod reader;
pub mod store;

pub use audit::{
    AuditExpectations, AuditReport, KeyCategories, audit_osm_file, audit_osm_xml,
};
pub use channels::{Channel, ChannelError, CsvChannels, OutputPaths, PerChannel, RowCounts};
pub use pipeline::{
    PipelineError, ProcessOptions, ProcessSummary, process_osm_file, process_osm_xml,
};
pub use reader::{OsmReadError, OsmXmlReader};
pub use store::{
    DatasetStatistics, LoadError, LoadSummary, Ranked, StatsError, dataset_statistics,
    dataset_statistics_from_path, load_all, load_csv_into_sqlite, load_table,
};
