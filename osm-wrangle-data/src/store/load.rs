#![forbid(unsafe_code)]

use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use rusqlite::{Connection, Error as SqliteError, Transaction, params_from_iter};
use thiserror::Error;

use super::schema::{create_table_sql, drop_table_sql, insert_sql, table_columns};
use crate::channels::{Channel, OutputPaths, RowCounts};

/// Errors raised while loading CSV files into SQLite.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to create the parent directory of the database.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Database path whose parent could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A CSV file could not be opened.
    #[error("failed to open CSV file {path:?}")]
    OpenCsv {
        /// Path of the CSV file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A CSV record could not be read.
    #[error("failed to read {table} CSV")]
    ReadCsv {
        /// Table being loaded.
        table: Channel,
        /// Source error returned by `csv`.
        #[source]
        source: csv::Error,
    },
    /// The CSV header does not match the table columns.
    #[error("{table} CSV header {found:?} does not match expected columns {expected:?}")]
    HeaderMismatch {
        /// Table being loaded.
        table: Channel,
        /// Expected column names.
        expected: Vec<String>,
        /// Header found in the file.
        found: Vec<String>,
    },
    /// A SQLite statement failed.
    #[error("failed to {operation} for table {table}")]
    Sqlite {
        /// Table being loaded.
        table: Channel,
        /// Short description of the failed step.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Rows inserted per table.
pub type LoadSummary = RowCounts;

/// Load the five CSV files into the database at `database`.
///
/// Each table is dropped, recreated, and filled inside its own transaction,
/// so loading the same files twice yields the same contents. The parent
/// directory of the database is created when missing.
pub fn load_csv_into_sqlite(
    database: &Utf8Path,
    csv: &OutputPaths,
) -> Result<LoadSummary, LoadError> {
    osm_wrangle_fs::ensure_parent_dir(database).map_err(|source| LoadError::CreateDirectory {
        path: database.to_path_buf(),
        source,
    })?;
    let mut connection =
        Connection::open(database.as_std_path()).map_err(|source| LoadError::Open {
            path: database.to_path_buf(),
            source,
        })?;
    info!("Loading CSV files into {database}");
    let summary = load_all(&mut connection, csv)?;
    info!(
        "Loaded {} nodes and {} ways into {database}",
        summary.nodes, summary.ways
    );
    Ok(summary)
}

/// Load the five CSV files through an open connection.
pub fn load_all(connection: &mut Connection, csv: &OutputPaths) -> Result<LoadSummary, LoadError> {
    RowCounts::try_from_fn(|channel| {
        let path = csv.get(channel);
        let file = osm_wrangle_fs::open_utf8_file(path).map_err(|source| LoadError::OpenCsv {
            path: path.clone(),
            source,
        })?;
        load_table(connection, channel, file)
    })
}

/// Replace the table for `channel` with the rows of one CSV stream.
///
/// The header row must match the table columns exactly. Values are bound as
/// text; the declared column types coerce them on insert.
///
/// # Examples
/// ```
/// use osm_wrangle_data::{Channel, load_table};
/// use rusqlite::Connection;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// let csv = "way_id,node_id,position\n5,1,0\n5,2,1\n";
/// let rows = load_table(&mut conn, Channel::WayNodes, csv.as_bytes()).expect("load rows");
/// assert_eq!(rows, 2);
/// let last: i64 = conn
///     .query_row("SELECT node_id FROM ways_nodes WHERE position = 1", [], |row| row.get(0))
///     .expect("query row");
/// assert_eq!(last, 2);
/// ```
pub fn load_table<R: Read>(
    connection: &mut Connection,
    channel: Channel,
    source: R,
) -> Result<u64, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(source);
    check_header(&mut reader, channel)?;

    let transaction = connection.transaction().map_err(|source| LoadError::Sqlite {
        table: channel,
        operation: "begin load transaction",
        source,
    })?;
    recreate_table(&transaction, channel)?;
    let rows = insert_rows(&transaction, channel, &mut reader)?;
    transaction.commit().map_err(|source| LoadError::Sqlite {
        table: channel,
        operation: "commit load transaction",
        source,
    })?;
    debug!("Loaded {rows} rows into {channel}");
    Ok(rows)
}

fn check_header<R: Read>(reader: &mut csv::Reader<R>, channel: Channel) -> Result<(), LoadError> {
    let found = reader
        .headers()
        .map_err(|source| LoadError::ReadCsv {
            table: channel,
            source,
        })?
        .iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    let expected = table_columns(channel)
        .iter()
        .map(|column| column.name.to_owned())
        .collect::<Vec<_>>();
    if found == expected {
        Ok(())
    } else {
        Err(LoadError::HeaderMismatch {
            table: channel,
            expected,
            found,
        })
    }
}

fn recreate_table(transaction: &Transaction<'_>, channel: Channel) -> Result<(), LoadError> {
    transaction
        .execute(&drop_table_sql(channel), [])
        .map_err(|source| LoadError::Sqlite {
            table: channel,
            operation: "drop table",
            source,
        })?;
    transaction
        .execute(&create_table_sql(channel), [])
        .map_err(|source| LoadError::Sqlite {
            table: channel,
            operation: "create table",
            source,
        })?;
    Ok(())
}

fn insert_rows<R: Read>(
    transaction: &Transaction<'_>,
    channel: Channel,
    reader: &mut csv::Reader<R>,
) -> Result<u64, LoadError> {
    let mut statement =
        transaction
            .prepare(&insert_sql(channel))
            .map_err(|source| LoadError::Sqlite {
                table: channel,
                operation: "prepare insert",
                source,
            })?;
    let mut rows = 0_u64;
    for entry in reader.records() {
        let record = entry.map_err(|source| LoadError::ReadCsv {
            table: channel,
            source,
        })?;
        statement
            .execute(params_from_iter(record.iter()))
            .map_err(|source| LoadError::Sqlite {
                table: channel,
                operation: "insert row",
                source,
            })?;
        rows += 1;
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn connection() -> Connection {
        Connection::open_in_memory().expect("create in-memory database")
    }

    const NODES_CSV: &str = "id,lat,lon,user,uid,version,changeset,timestamp\n\
        1,37.8,-122.2,alice,12,3,9911,2016-01-02T03:04:05Z\n\
        2,37.9,-122.1,99999999,99999999,1,7,2016-01-02T03:04:05Z\n";

    #[rstest]
    fn loads_rows_with_column_affinity(mut connection: Connection) {
        let rows = load_table(&mut connection, Channel::Nodes, NODES_CSV.as_bytes())
            .expect("load nodes");
        assert_eq!(rows, 2);

        let (id, lat, version): (i64, f64, String) = connection
            .query_row("SELECT id, lat, version FROM nodes WHERE id = 1", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .expect("read node");
        assert_eq!(id, 1);
        assert_eq!(lat, 37.8);
        assert_eq!(version, "3");

        let types: (String, String) = connection
            .query_row(
                "SELECT typeof(uid), typeof(user) FROM nodes WHERE id = 2",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("read column types");
        assert_eq!(types, ("integer".to_owned(), "text".to_owned()));
    }

    #[rstest]
    fn reloading_replaces_previous_contents(mut connection: Connection) {
        load_table(&mut connection, Channel::Nodes, NODES_CSV.as_bytes()).expect("first load");
        load_table(&mut connection, Channel::Nodes, NODES_CSV.as_bytes()).expect("second load");
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))
            .expect("count nodes");
        assert_eq!(count, 2);
    }

    #[rstest]
    fn header_only_file_creates_empty_table(mut connection: Connection) {
        let rows = load_table(
            &mut connection,
            Channel::WayTags,
            "owner_id,key,type,value\n".as_bytes(),
        )
        .expect("load empty table");
        assert_eq!(rows, 0);
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM ways_tags", [], |row| row.get(0))
            .expect("count rows");
        assert_eq!(count, 0);
    }

    #[rstest]
    fn rejects_unexpected_header(mut connection: Connection) {
        let err = load_table(
            &mut connection,
            Channel::NodeTags,
            "id,key,type,value\n1,a,regular,b\n".as_bytes(),
        )
        .expect_err("header mismatch must fail");
        match err {
            LoadError::HeaderMismatch { table, found, .. } => {
                assert_eq!(table, Channel::NodeTags);
                assert_eq!(found.first().map(String::as_str), Some("id"));
            }
            other => panic!("expected header mismatch, got {other:?}"),
        }
    }

    #[rstest]
    fn rejects_ragged_rows(mut connection: Connection) {
        let err = load_table(
            &mut connection,
            Channel::WayNodes,
            "way_id,node_id,position\n1,2\n".as_bytes(),
        )
        .expect_err("short row must fail");
        assert!(matches!(err, LoadError::ReadCsv { .. }), "{err:?}");
        let exists: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'ways_nodes'",
                [],
                |row| row.get(0),
            )
            .expect("inspect schema");
        assert_eq!(exists, 0, "failed load must roll back");
    }
}
