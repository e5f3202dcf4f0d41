//! Facade crate for the OpenStreetMap wrangling pipeline.
//!
//! This crate re-exports the cleaning and shaping domain types and, behind the
//! `data` feature, the streaming pipeline, bulk loader and reporting passes.

#![forbid(unsafe_code)]

pub use osm_wrangle_core::{
    CleaningRules, ElementKind, NodeRecord, PLACEHOLDER, RawElement, RawNode, RawTag, RawWay,
    SchemaViolation, ShapedElement, ShapedNode, ShapedWay, Shaper, TagRecord, WayNodeRecord,
    WayRecord, flatten_tag, validate_element,
};

#[cfg(feature = "data")]
pub use osm_wrangle_data::{
    AuditExpectations, AuditReport, DatasetStatistics, LoadError, LoadSummary, OsmReadError,
    OsmXmlReader, OutputPaths, PipelineError, ProcessOptions, ProcessSummary, StatsError,
    audit_osm_file, dataset_statistics_from_path, load_csv_into_sqlite, process_osm_file,
    process_osm_xml,
};
