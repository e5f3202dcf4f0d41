//! Test helpers for laying out extracts in temporary directories.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

pub(super) const SAMPLE_EXTRACT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="37.8044" lon="-122.2712" version="2" changeset="10" timestamp="2016-05-01T10:00:00Z" user="alice" uid="1">
    <tag k="amenity" v="cafe"/>
    <tag k="addr:street" v="Grand Ave"/>
    <tag k="addr:postcode" v="CA 94612"/>
  </node>
  <node id="2" lat="37.8716" lon="-122.2727" version="1" changeset="11" timestamp="2016-05-02T11:00:00Z" user="bob" uid="2">
    <tag k="amenity" v="cafe"/>
  </node>
  <way id="3" version="1" changeset="12" timestamp="2016-05-03T12:00:00Z" user="alice" uid="1">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="residential"/>
    <tag k="addr:city" v="berkeley"/>
  </way>
</osm>
"#;

pub(super) const OUT_OF_RANGE_EXTRACT: &str = r#"<osm>
  <node id="1" lat="137.8" lon="-122.2"/>
</osm>
"#;

/// Temporary directory viewed through UTF-8 paths.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        write_utf8(&path, contents.as_bytes());
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write fixture");
}

/// Parse the JSON report captured from a command writer.
pub(super) fn report_json(output: &[u8]) -> serde_json::Value {
    assert!(output.ends_with(b"\n"), "reports end with a newline");
    serde_json::from_slice(output).expect("report is valid JSON")
}
