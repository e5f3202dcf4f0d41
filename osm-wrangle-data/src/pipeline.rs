//! Streaming extract-to-CSV pipeline.
//!
//! Elements are read, shaped, optionally validated, and written one at a
//! time, so memory use does not grow with the size of the extract.
#![forbid(unsafe_code)]

use std::io::{BufRead, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use log::{debug, info};
use osm_wrangle_core::{SchemaViolation, Shaper, validate_element};
use thiserror::Error;

use crate::channels::{ChannelError, CsvChannels, OutputPaths, PerChannel, RowCounts};
use crate::reader::{OsmReadError, OsmXmlReader};

/// Knobs for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessOptions {
    /// Check every shaped element against the row schema and stop at the
    /// first failure.
    pub validate: bool,
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct ProcessSummary {
    /// Number of top-level `node` and `way` elements processed.
    pub elements: u64,
    /// Data rows written to each channel, headers excluded.
    pub rows: RowCounts,
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading the extract failed.
    #[error(transparent)]
    Read(#[from] OsmReadError),
    /// A shaped element failed validation.
    #[error("element {ordinal} failed schema validation")]
    Validation {
        /// One-based position of the element among nodes and ways.
        ordinal: u64,
        /// Details of every failed check.
        #[source]
        source: SchemaViolation,
    },
    /// An output file could not be created.
    #[error("failed to create output file {path:?}")]
    Create {
        /// Path of the output file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Flushing an output file failed.
    #[error("failed to flush output file {path:?}")]
    Flush {
        /// Path of the output file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Writing a CSV row failed.
    #[error(transparent)]
    Write(#[from] ChannelError),
}

/// Shape every element from `reader` and write the rows to `channels`.
///
/// Rows appear in the channels in the order their elements appear in the
/// source. Headers are already present because [`CsvChannels::new`] writes
/// them.
///
/// # Examples
/// ```
/// use osm_wrangle_core::Shaper;
/// use osm_wrangle_data::{CsvChannels, OsmXmlReader, PerChannel, ProcessOptions, process_osm_xml};
///
/// let xml = r#"<osm><node id="1" lat="1" lon="2"><tag k="amenity" v="cafe"/></node></osm>"#;
/// let sinks = PerChannel::from_fn(|_| Vec::<u8>::new());
/// let mut channels = CsvChannels::new(sinks).expect("write headers");
/// let summary = process_osm_xml(
///     OsmXmlReader::new(xml.as_bytes()),
///     &Shaper::default(),
///     &mut channels,
///     ProcessOptions { validate: true },
/// )
/// .expect("process extract");
/// assert_eq!(summary.rows.nodes, 1);
/// assert_eq!(summary.rows.nodes_tags, 1);
/// ```
pub fn process_osm_xml<R: BufRead, W: Write>(
    reader: OsmXmlReader<R>,
    shaper: &Shaper,
    channels: &mut CsvChannels<W>,
    options: ProcessOptions,
) -> Result<ProcessSummary, PipelineError> {
    let mut elements = 0_u64;
    for next in reader {
        let element = next?;
        elements += 1;
        let shaped = shaper.shape(&element);
        if options.validate {
            validate_element(&shaped).map_err(|source| PipelineError::Validation {
                ordinal: elements,
                source,
            })?;
        }
        channels.write(&shaped)?;
    }
    debug!("Processed {elements} elements");
    Ok(ProcessSummary {
        elements,
        rows: *channels.rows(),
    })
}

/// Run the pipeline from an extract on disk to the five CSV files.
///
/// Output files are created (or truncated) before the first element is read,
/// and parent directories are created as needed.
pub fn process_osm_file(
    input: &Utf8Path,
    outputs: &OutputPaths,
    shaper: &Shaper,
    options: ProcessOptions,
) -> Result<ProcessSummary, PipelineError> {
    info!("Processing OSM extract {input}");
    let reader = OsmXmlReader::from_path(input)?;
    let files = PerChannel::try_from_fn(|channel| {
        let path = outputs.get(channel);
        osm_wrangle_fs::create_utf8_file(path).map_err(|source| PipelineError::Create {
            path: path.clone(),
            source,
        })
    })?;
    let mut channels = CsvChannels::new(files.map(BufWriter::new))?;
    let summary = process_osm_xml(reader, shaper, &mut channels, options)?;
    for (channel, writer) in channels.finish()?.into_array() {
        writer
            .into_inner()
            .map(|_: fs_utf8::File| ())
            .map_err(|err| PipelineError::Flush {
                path: outputs.get(channel).clone(),
                source: err.into_error(),
            })?;
    }
    info!(
        "Wrote {} nodes, {} node tags, {} ways, {} way nodes, {} way tags",
        summary.rows.nodes,
        summary.rows.nodes_tags,
        summary.rows.ways,
        summary.rows.ways_nodes,
        summary.rows.ways_tags
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Channel;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    const EXTRACT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="37.80" lon="-122.27" user="alice" uid="12" version="1" changeset="5" timestamp="2016-01-01T00:00:00Z">
    <tag k="addr:postcode" v="94612-1234"/>
    <tag k="amenity" v="library"/>
  </node>
  <node id="2" lat="37.81" lon="-122.26" user="bob" uid="13" version="2" changeset="6" timestamp="2016-01-01T00:00:00Z"/>
  <way id="3" user="alice" uid="12" version="1" changeset="7" timestamp="2016-01-01T00:00:00Z">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="addr:street" v="Broadway St."/>
  </way>
</osm>"#;

    #[fixture]
    fn sinks() -> PerChannel<Vec<u8>> {
        PerChannel::from_fn(|_| Vec::new())
    }

    fn run(xml: &str, options: ProcessOptions) -> Result<ProcessSummary, PipelineError> {
        let mut channels = CsvChannels::new(sinks()).expect("write headers");
        process_osm_xml(
            OsmXmlReader::new(xml.as_bytes()),
            &Shaper::default(),
            &mut channels,
            options,
        )
    }

    #[rstest]
    fn counts_rows_per_channel() {
        let summary = run(EXTRACT, ProcessOptions { validate: true }).expect("process extract");
        assert_eq!(summary.elements, 3);
        assert_eq!(
            summary.rows,
            RowCounts {
                nodes: 2,
                nodes_tags: 2,
                ways: 1,
                ways_nodes: 2,
                ways_tags: 1,
            }
        );
    }

    #[rstest]
    fn repeated_runs_write_identical_bytes() {
        let write_all = || {
            let mut channels = CsvChannels::new(sinks()).expect("write headers");
            process_osm_xml(
                OsmXmlReader::new(EXTRACT.as_bytes()),
                &Shaper::default(),
                &mut channels,
                ProcessOptions::default(),
            )
            .expect("process extract");
            channels.finish().expect("flush channels")
        };
        let first = write_all();
        assert_eq!(first, write_all());
        let ways_nodes = String::from_utf8(first.ways_nodes).expect("utf-8 CSV");
        assert_eq!(ways_nodes, "way_id,node_id,position\n3,1,0\n3,2,1\n");
    }

    #[rstest]
    fn validation_reports_element_ordinal() {
        let xml = r#"<osm><node id="1" lat="1" lon="1"/><node id="2" lat="91" lon="1"/></osm>"#;
        let err = run(xml, ProcessOptions { validate: true }).expect_err("latitude out of range");
        match err {
            PipelineError::Validation { ordinal, source } => {
                assert_eq!(ordinal, 2);
                assert_eq!(source.element_id.as_deref(), Some("2"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[rstest]
    fn invalid_rows_pass_without_validation() {
        let xml = r#"<osm><node id="x" lat="91" lon="1"/></osm>"#;
        let summary = run(xml, ProcessOptions::default()).expect("process extract");
        assert_eq!(summary.rows.nodes, 1);
    }

    #[rstest]
    fn malformed_xml_is_fatal() {
        let xml = r#"<osm><node id="1"/><way id="2"></node></osm>"#;
        let err = run(xml, ProcessOptions::default()).expect_err("malformed input");
        assert!(
            matches!(err, PipelineError::Read(OsmReadError::Xml { elements: 1, .. })),
            "{err:?}"
        );
    }

    #[rstest]
    fn writes_five_files() {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8Path::from_path(dir.path()).expect("utf-8 temp dir");
        let input = root.join("extract.osm");
        std::fs::write(&input, EXTRACT).expect("write extract");
        let outputs = OutputPaths::in_dir(&root.join("out"));

        let summary = process_osm_file(
            &input,
            &outputs,
            &Shaper::default(),
            ProcessOptions::default(),
        )
        .expect("process file");
        assert_eq!(summary.rows.ways_nodes, 2);

        let ways_tags = std::fs::read_to_string(outputs.get(Channel::WayTags)).expect("read CSV");
        assert_eq!(ways_tags, "owner_id,key,type,value\n3,street,addr,Broadway Street\n");
        let nodes_tags = std::fs::read_to_string(&outputs.nodes_tags).expect("read CSV");
        assert!(nodes_tags.contains("1,postcode,addr,94612\n"), "{nodes_tags}");
    }

    #[rstest]
    fn missing_input_is_reported() {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8Path::from_path(dir.path()).expect("utf-8 temp dir");
        let err = process_osm_file(
            &root.join("missing.osm"),
            &OutputPaths::in_dir(root),
            &Shaper::default(),
            ProcessOptions::default(),
        )
        .expect_err("missing input");
        assert!(
            matches!(err, PipelineError::Read(OsmReadError::Open { .. })),
            "{err:?}"
        );
    }
}
