//! SQLite storage for the CSV channels.
//!
//! Each channel maps to a table of the same name. Loading replaces the table
//! wholesale; statistics are read-only queries over the loaded tables.

mod load;
mod schema;
mod stats;

pub use load::{LoadError, LoadSummary, load_all, load_csv_into_sqlite, load_table};
pub use schema::{Column, table_columns};
pub use stats::{
    DatasetStatistics, Ranked, StatsError, dataset_statistics, dataset_statistics_from_path,
};
