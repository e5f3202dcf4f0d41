//! Runs the commands against a small extract and inspects their reports.

use super::helpers::{OUT_OF_RANGE_EXTRACT, SAMPLE_EXTRACT, Workspace, report_json};
use super::*;
use crate::audit::AuditArgs;
use crate::load::LoadArgs;
use crate::process::ProcessArgs;
use crate::stats::StatsArgs;
use osm_wrangle_data::PipelineError;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn workspace() -> Workspace {
    let workspace = Workspace::new();
    workspace.write("oakland.osm", SAMPLE_EXTRACT);
    workspace
}

fn run_process(workspace: &Workspace) -> serde_json::Value {
    let args = ProcessArgs {
        osm_xml: Some(workspace.root().join("oakland.osm")),
        output_dir: Some(workspace.root().join("csv")),
        validate: Some(true),
    };
    let mut output = Vec::new();
    process::run_process_with(args, &mut output).expect("process extract");
    report_json(&output)
}

fn run_load(workspace: &Workspace) -> serde_json::Value {
    let args = LoadArgs {
        csv_dir: Some(workspace.root().join("csv")),
        database: Some(workspace.root().join("osm.db")),
    };
    let mut output = Vec::new();
    load::run_load_with(args, &mut output).expect("load CSV files");
    report_json(&output)
}

#[rstest]
fn process_reports_rows_per_channel(workspace: Workspace) {
    let report = run_process(&workspace);
    assert_eq!(report["elements"], json!(3));
    assert_eq!(
        report["rows"],
        json!({
            "nodes": 2,
            "nodes_tags": 4,
            "ways": 1,
            "ways_nodes": 2,
            "ways_tags": 2,
        })
    );
    assert!(workspace.root().join("csv/ways_tags.csv").is_file());
}

#[rstest]
fn load_reports_the_rows_written(workspace: Workspace) {
    let processed = run_process(&workspace);
    let loaded = run_load(&workspace);
    assert_eq!(loaded, processed["rows"]);

    let connection =
        rusqlite::Connection::open(workspace.root().join("osm.db")).expect("open database");
    let street: String = connection
        .query_row(
            "SELECT value FROM nodes_tags WHERE key = 'street'",
            [],
            |row| row.get(0),
        )
        .expect("street tag loaded");
    assert_eq!(street, "Grand Avenue");
}

#[rstest]
fn stats_summarise_the_loaded_database(workspace: Workspace) {
    run_process(&workspace);
    run_load(&workspace);
    let args = StatsArgs {
        database: Some(workspace.root().join("osm.db")),
        limit: Some(1),
    };
    let mut output = Vec::new();
    stats::run_stats_with(args, &mut output).expect("compute statistics");
    let report = report_json(&output);
    assert_eq!(report["nodes"], json!(2));
    assert_eq!(report["ways"], json!(1));
    assert_eq!(report["unique_users"], json!(2));
    assert_eq!(report["top_users"], json!([{ "value": "alice", "count": 2 }]));
    assert_eq!(
        report["top_amenities"],
        json!([{ "value": "cafe", "count": 2 }])
    );
    assert_eq!(
        report["top_postcodes"],
        json!([{ "value": "94612", "count": 1 }])
    );
}

#[rstest]
fn audit_reports_raw_values(workspace: Workspace) {
    let args = AuditArgs {
        osm_xml: Some(workspace.root().join("oakland.osm")),
    };
    let mut output = Vec::new();
    audit::run_audit_with(args, &mut output).expect("audit extract");
    let report = report_json(&output);
    assert_eq!(
        report["unexpected_street_types"],
        json!({ "Ave": ["Grand Ave"] })
    );
    assert_eq!(report["unexpected_cities"], json!({ "berkeley": 1 }));
    assert_eq!(report["postcodes"], json!({ "CA 94612": 1 }));
    assert_eq!(report["amenities"], json!({ "cafe": 2 }));
    assert_eq!(report["unique_users"], json!(2));
}

#[rstest]
fn validation_failure_is_reported_as_process_error() {
    let workspace = Workspace::new();
    let extract = workspace.write("bad.osm", OUT_OF_RANGE_EXTRACT);
    let args = ProcessArgs {
        osm_xml: Some(extract),
        output_dir: Some(workspace.root().join("csv")),
        validate: Some(true),
    };
    let mut output = Vec::new();
    let err = process::run_process_with(args, &mut output).expect_err("latitude out of range");
    match err {
        CliError::Process(source) => {
            assert!(
                matches!(*source, PipelineError::Validation { ordinal: 1, .. }),
                "{source:?}"
            );
        }
        other => panic!("expected Process error, found {other:?}"),
    }
    assert!(output.is_empty(), "no report is written on failure");
}

#[rstest]
fn stats_require_an_existing_database() {
    let workspace = Workspace::new();
    let args = StatsArgs {
        database: Some(workspace.root().join("absent.db")),
        limit: None,
    };
    let mut output = Vec::new();
    let err = stats::run_stats_with(args, &mut output).expect_err("database is missing");
    assert!(
        matches!(err, CliError::MissingSourceFile { field: ARG_DATABASE, .. }),
        "{err:?}"
    );
}
