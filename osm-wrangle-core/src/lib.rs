//! Core domain for the OpenStreetMap wrangling pipeline.
//!
//! Responsibilities:
//! - Clean address fields (street, city, postcode) against static tables.
//! - Flatten raw `k`/`v` tags into `(key, type, value)` rows.
//! - Shape raw `node`/`way` elements into normalised rows.
//! - Validate shaped rows against the declared schema.
//!
//! Boundaries:
//! - No I/O. Reading XML and writing rows live in `osm-wrangle-data`.
//!
//! Invariants:
//! - No global mutable state; cleaning rules are passed in as values.
#![forbid(unsafe_code)]

pub mod clean;
pub mod element;
pub mod record;
pub mod schema;
pub mod shape;
pub mod tags;

pub use clean::CleaningRules;
pub use element::{Attributes, ElementKind, RawElement, RawNode, RawTag, RawWay};
pub use record::{
    NODE_FIELDS, NodeRecord, PLACEHOLDER, REGULAR_TAG_TYPE, TAG_FIELDS, TagRecord,
    WAY_FIELDS, WAY_NODE_FIELDS, WayNodeRecord, WayRecord,
};
pub use schema::{FieldViolation, SchemaViolation, ViolationReason, validate_element};
pub use shape::{ShapedElement, ShapedNode, ShapedWay, Shaper};
pub use tags::{flatten_tag, has_problem_chars};
