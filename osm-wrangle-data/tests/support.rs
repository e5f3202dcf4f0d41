//! Shared helpers for the data crate integration tests.

use camino::{Utf8Path, Utf8PathBuf};
use std::{fs, path::Path};

/// Directory containing the XML fixtures.
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Absolute path of a fixture file.
pub fn fixture_path(name: &str) -> Utf8PathBuf {
    fixtures_dir().join(name)
}

/// View a temporary path as UTF-8.
pub fn utf8(path: &Path) -> &Utf8Path {
    Utf8Path::from_path(path).unwrap_or_else(|| panic!("non UTF-8 temp path {path:?}"))
}

/// Assert that the scenarios of a feature file appear in the given order.
pub fn assert_scenario_order(feature: &str, expected: &[&str]) {
    let path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/features")
        .join(feature);
    let contents = fs::read_to_string(&path).unwrap_or_else(|err| {
        panic!("failed to read feature file {path}: {err}");
    });
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles, expected,
        "scenario order changed in feature file {path}"
    );
}
