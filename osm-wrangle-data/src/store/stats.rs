#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::{Connection, Error as SqliteError, OpenFlags};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while summarising a loaded database.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A summary query failed.
    #[error("failed to query {query}")]
    Query {
        /// Name of the failed query.
        query: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// A value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
    /// The counted value.
    pub value: String,
    /// Number of occurrences.
    pub count: i64,
}

/// Summary figures for a loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetStatistics {
    /// Rows in `nodes`.
    pub nodes: i64,
    /// Rows in `ways`.
    pub ways: i64,
    /// Distinct `uid` values across nodes and ways.
    pub unique_users: i64,
    /// Users who edited exactly one node or way.
    pub single_edit_users: i64,
    /// Users with the most nodes and ways.
    pub top_users: Vec<Ranked>,
    /// Most frequent `addr:postcode` values.
    pub top_postcodes: Vec<Ranked>,
    /// Most frequent `addr:city` values.
    pub top_cities: Vec<Ranked>,
    /// Most frequent `amenity` values on nodes.
    pub top_amenities: Vec<Ranked>,
}

const ALL_EDITS: &str = "SELECT user, uid FROM nodes UNION ALL SELECT user, uid FROM ways";
const ALL_TAGS: &str = "SELECT key, value FROM nodes_tags \
    UNION ALL SELECT key, value FROM ways_tags";

/// Open the database read-only and compute [`DatasetStatistics`].
pub fn dataset_statistics_from_path(
    path: &Utf8Path,
    limit: usize,
) -> Result<DatasetStatistics, StatsError> {
    let connection =
        Connection::open_with_flags(path.as_std_path(), OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| StatsError::Open {
                path: path.to_path_buf(),
                source,
            })?;
    dataset_statistics(&connection, limit)
}

/// Compute [`DatasetStatistics`] over the five loaded tables.
///
/// Ranked lists hold at most `limit` entries, ordered by descending count and
/// then by value.
pub fn dataset_statistics(
    connection: &Connection,
    limit: usize,
) -> Result<DatasetStatistics, StatsError> {
    let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);
    Ok(DatasetStatistics {
        nodes: scalar(connection, "node count", "SELECT COUNT(*) FROM nodes")?,
        ways: scalar(connection, "way count", "SELECT COUNT(*) FROM ways")?,
        unique_users: scalar(
            connection,
            "unique users",
            &format!("SELECT COUNT(DISTINCT uid) FROM ({ALL_EDITS})"),
        )?,
        single_edit_users: scalar(
            connection,
            "single-edit users",
            &format!(
                "SELECT COUNT(*) FROM \
                 (SELECT user FROM ({ALL_EDITS}) GROUP BY user HAVING COUNT(*) = 1)"
            ),
        )?,
        top_users: ranked(
            connection,
            "top users",
            &format!(
                "SELECT user, COUNT(*) AS count FROM ({ALL_EDITS}) \
                 GROUP BY user ORDER BY count DESC, user LIMIT ?1"
            ),
            (row_limit,),
        )?,
        top_postcodes: tag_values(connection, "top postcodes", "postcode", row_limit)?,
        top_cities: tag_values(connection, "top cities", "city", row_limit)?,
        top_amenities: ranked(
            connection,
            "top amenities",
            "SELECT value, COUNT(*) AS count FROM nodes_tags \
             WHERE key = 'amenity' GROUP BY value ORDER BY count DESC, value LIMIT ?1",
            (row_limit,),
        )?,
    })
}

fn scalar(connection: &Connection, query: &'static str, sql: &str) -> Result<i64, StatsError> {
    connection
        .query_row(sql, [], |row| row.get(0))
        .map_err(|source| StatsError::Query { query, source })
}

fn tag_values(
    connection: &Connection,
    query: &'static str,
    key: &str,
    limit: i64,
) -> Result<Vec<Ranked>, StatsError> {
    ranked(
        connection,
        query,
        &format!(
            "SELECT value, COUNT(*) AS count FROM ({ALL_TAGS}) \
             WHERE key = ?1 \
             GROUP BY value ORDER BY count DESC, value LIMIT ?2"
        ),
        (key, limit),
    )
}

fn ranked<P: rusqlite::Params>(
    connection: &Connection,
    query: &'static str,
    sql: &str,
    params: P,
) -> Result<Vec<Ranked>, StatsError> {
    let to_error = |source| StatsError::Query { query, source };
    let mut statement = connection.prepare(sql).map_err(to_error)?;
    let rows = statement
        .query_map(params, |row| {
            Ok(Ranked {
                value: row.get(0)?,
                count: row.get(1)?,
            })
        })
        .map_err(to_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_error)
}
