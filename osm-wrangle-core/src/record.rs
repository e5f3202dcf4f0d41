//! Normalised rows produced by the shaper.
//!
//! Absent attributes stay `None` here. The [`PLACEHOLDER`] encoding is only
//! applied when rows leave the process, via the `encoded` helpers.

use crate::element::Attributes;

/// Filler written in place of an attribute the source element lacked.
pub const PLACEHOLDER: &str = "99999999";

/// Core attribute names read from `node` elements, in column order.
pub const NODE_FIELDS: [&str; 8] = [
    "id",
    "lat",
    "lon",
    "user",
    "uid",
    "version",
    "changeset",
    "timestamp",
];

/// Core attribute names read from `way` elements, in column order.
pub const WAY_FIELDS: [&str; 6] = ["id", "user", "uid", "version", "changeset", "timestamp"];

/// Column names of the node and way tag streams.
pub const TAG_FIELDS: [&str; 4] = ["owner_id", "key", "type", "value"];

/// Column names of the way-node stream.
pub const WAY_NODE_FIELDS: [&str; 3] = ["way_id", "node_id", "position"];

/// Tag type used when a key carries no namespace prefix.
pub const REGULAR_TAG_TYPE: &str = "regular";

fn attribute(attributes: &Attributes, name: &str) -> Option<String> {
    attributes.get(name).cloned()
}

/// Return the value, or [`PLACEHOLDER`] when it is absent.
#[must_use]
pub fn encode(value: Option<&str>) -> &str {
    value.unwrap_or(PLACEHOLDER)
}

/// Core attributes of a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeRecord {
    /// Node identifier.
    pub id: Option<String>,
    /// Latitude in decimal degrees.
    pub lat: Option<String>,
    /// Longitude in decimal degrees.
    pub lon: Option<String>,
    /// Name of the last editor.
    pub user: Option<String>,
    /// Identifier of the last editor.
    pub uid: Option<String>,
    /// Element version.
    pub version: Option<String>,
    /// Changeset that last touched the element.
    pub changeset: Option<String>,
    /// Timestamp of the last edit.
    pub timestamp: Option<String>,
}

impl NodeRecord {
    /// Read the [`NODE_FIELDS`] from an attribute map.
    #[must_use]
    pub fn from_attributes(attributes: &Attributes) -> Self {
        Self {
            id: attribute(attributes, "id"),
            lat: attribute(attributes, "lat"),
            lon: attribute(attributes, "lon"),
            user: attribute(attributes, "user"),
            uid: attribute(attributes, "uid"),
            version: attribute(attributes, "version"),
            changeset: attribute(attributes, "changeset"),
            timestamp: attribute(attributes, "timestamp"),
        }
    }

    /// Field names paired with their values, in [`NODE_FIELDS`] order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, Option<&str>); 8] {
        [
            ("id", self.id.as_deref()),
            ("lat", self.lat.as_deref()),
            ("lon", self.lon.as_deref()),
            ("user", self.user.as_deref()),
            ("uid", self.uid.as_deref()),
            ("version", self.version.as_deref()),
            ("changeset", self.changeset.as_deref()),
            ("timestamp", self.timestamp.as_deref()),
        ]
    }

    /// Column values with absent attributes replaced by [`PLACEHOLDER`].
    #[must_use]
    pub fn encoded(&self) -> [&str; 8] {
        self.fields().map(|(_, value)| encode(value))
    }
}

/// Core attributes of a way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WayRecord {
    /// Way identifier.
    pub id: Option<String>,
    /// Name of the last editor.
    pub user: Option<String>,
    /// Identifier of the last editor.
    pub uid: Option<String>,
    /// Element version.
    pub version: Option<String>,
    /// Changeset that last touched the element.
    pub changeset: Option<String>,
    /// Timestamp of the last edit.
    pub timestamp: Option<String>,
}

impl WayRecord {
    /// Read the [`WAY_FIELDS`] from an attribute map.
    #[must_use]
    pub fn from_attributes(attributes: &Attributes) -> Self {
        Self {
            id: attribute(attributes, "id"),
            user: attribute(attributes, "user"),
            uid: attribute(attributes, "uid"),
            version: attribute(attributes, "version"),
            changeset: attribute(attributes, "changeset"),
            timestamp: attribute(attributes, "timestamp"),
        }
    }

    /// Field names paired with their values, in [`WAY_FIELDS`] order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("id", self.id.as_deref()),
            ("user", self.user.as_deref()),
            ("uid", self.uid.as_deref()),
            ("version", self.version.as_deref()),
            ("changeset", self.changeset.as_deref()),
            ("timestamp", self.timestamp.as_deref()),
        ]
    }

    /// Column values with absent attributes replaced by [`PLACEHOLDER`].
    #[must_use]
    pub fn encoded(&self) -> [&str; 6] {
        self.fields().map(|(_, value)| encode(value))
    }
}

/// A normalised tag owned by a node or way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// Identifier of the owning element.
    pub owner_id: Option<String>,
    /// Local key after the namespace prefix was split off.
    pub key: String,
    /// Namespace prefix, or [`REGULAR_TAG_TYPE`].
    pub kind: String,
    /// Cleaned value.
    pub value: String,
}

impl TagRecord {
    /// Column values in [`TAG_FIELDS`] order.
    #[must_use]
    pub fn encoded(&self) -> [&str; 4] {
        [
            encode(self.owner_id.as_deref()),
            self.key.as_str(),
            self.kind.as_str(),
            self.value.as_str(),
        ]
    }
}

/// One ordered node reference of a way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WayNodeRecord {
    /// Identifier of the owning way.
    pub way_id: Option<String>,
    /// Identifier of the referenced node; not checked against the node rows.
    pub node_id: Option<String>,
    /// Zero-based position within the way.
    pub position: usize,
}

impl WayNodeRecord {
    /// Column values in [`WAY_NODE_FIELDS`] order.
    #[must_use]
    pub fn encoded(&self) -> [String; 3] {
        [
            encode(self.way_id.as_deref()).to_owned(),
            encode(self.node_id.as_deref()).to_owned(),
            self.position.to_string(),
        ]
    }
}
