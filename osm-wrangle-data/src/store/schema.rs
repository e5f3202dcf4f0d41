#![forbid(unsafe_code)]

use crate::channels::Channel;

/// A column of a loaded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name, matching the CSV header.
    pub name: &'static str,
    /// Declared SQLite type, which sets the column affinity.
    pub sql_type: &'static str,
}

const fn column(name: &'static str, sql_type: &'static str) -> Column {
    Column { name, sql_type }
}

const NODES: [Column; 8] = [
    column("id", "INTEGER"),
    column("lat", "NUMERIC"),
    column("lon", "NUMERIC"),
    column("user", "TEXT"),
    column("uid", "INTEGER"),
    column("version", "TEXT"),
    column("changeset", "INTEGER"),
    column("timestamp", "TEXT"),
];

const WAYS: [Column; 6] = [
    column("id", "INTEGER"),
    column("user", "TEXT"),
    column("uid", "INTEGER"),
    column("version", "TEXT"),
    column("changeset", "INTEGER"),
    column("timestamp", "TEXT"),
];

const TAGS: [Column; 4] = [
    column("owner_id", "INTEGER"),
    column("key", "TEXT"),
    column("type", "TEXT"),
    column("value", "TEXT"),
];

const WAY_NODES: [Column; 3] = [
    column("way_id", "INTEGER"),
    column("node_id", "INTEGER"),
    column("position", "INTEGER"),
];

/// Table definition for a channel. Column order matches the CSV header.
#[must_use]
pub const fn table_columns(channel: Channel) -> &'static [Column] {
    match channel {
        Channel::Nodes => &NODES,
        Channel::Ways => &WAYS,
        Channel::NodeTags | Channel::WayTags => &TAGS,
        Channel::WayNodes => &WAY_NODES,
    }
}

pub(crate) fn create_table_sql(channel: Channel) -> String {
    let columns = table_columns(channel)
        .iter()
        .map(|column| format!("\"{}\" {}", column.name, column.sql_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE \"{}\" ({columns})", channel.name())
}

pub(crate) fn drop_table_sql(channel: Channel) -> String {
    format!("DROP TABLE IF EXISTS \"{}\"", channel.name())
}

pub(crate) fn insert_sql(channel: Channel) -> String {
    let spec = table_columns(channel);
    let names = spec
        .iter()
        .map(|column| format!("\"{}\"", column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=spec.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO \"{}\" ({names}) VALUES ({placeholders})",
        channel.name()
    )
}
