//! Schema checks applied to shaped elements in validation mode.
//!
//! Absent attributes are accepted (they are written as the placeholder)
//! except where a row cannot be keyed without them: the element `id` and the
//! `ref` of every way node.

use std::fmt;

use thiserror::Error;

use crate::element::ElementKind;
use crate::record::{TagRecord, WayNodeRecord};
use crate::shape::{ShapedElement, ShapedNode, ShapedWay};

/// Why a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViolationReason {
    /// A required value was absent.
    Missing,
    /// The value is empty.
    Empty,
    /// The value is not an integer.
    NotInteger,
    /// The value is not a decimal number.
    NotDecimal,
    /// The value lies outside the allowed range.
    OutOfRange {
        /// Lower bound, inclusive.
        min: f64,
        /// Upper bound, inclusive.
        max: f64,
    },
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("required field is missing"),
            Self::Empty => f.write_str("must not be empty"),
            Self::NotInteger => f.write_str("must be an integer"),
            Self::NotDecimal => f.write_str("must be a decimal number"),
            Self::OutOfRange { min, max } => write!(f, "must lie within [{min}, {max}]"),
        }
    }
}

/// A single failed field check.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    /// Path of the field, e.g. `lat` or `tags[2].key`.
    pub field: String,
    /// The offending value, if one was present.
    pub value: Option<String>,
    /// What was wrong with it.
    pub reason: ViolationReason,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}: {} (got {value:?})", self.field, self.reason),
            None => write!(f, "{}: {}", self.field, self.reason),
        }
    }
}

/// A shaped element that does not match the declared schema.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "element of type '{kind}' (id {}) has the following errors: {}",
    .element_id.as_deref().unwrap_or("unknown"),
    join_violations(.violations)
)]
pub struct SchemaViolation {
    /// Kind of the offending element.
    pub kind: ElementKind,
    /// Identifier of the offending element, if present.
    pub element_id: Option<String>,
    /// Every failed check, in field order.
    pub violations: Vec<FieldViolation>,
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

const LATITUDE: ViolationReason = ViolationReason::OutOfRange {
    min: -90.0,
    max: 90.0,
};
const LONGITUDE: ViolationReason = ViolationReason::OutOfRange {
    min: -180.0,
    max: 180.0,
};

/// Check a shaped element against the row schema.
///
/// Every violation is collected before returning so the error describes the
/// whole element.
///
/// # Examples
/// ```
/// use osm_wrangle_core::{Attributes, RawElement, RawNode, Shaper, validate_element};
///
/// let node = RawNode {
///     attributes: Attributes::from([
///         ("id".into(), "1".into()),
///         ("lat".into(), "95.0".into()),
///     ]),
///     tags: Vec::new(),
/// };
/// let shaped = Shaper::default().shape(&RawElement::Node(node));
/// let err = validate_element(&shaped).expect_err("latitude is out of range");
/// assert_eq!(err.violations[0].field, "lat");
/// ```
pub fn validate_element(element: &ShapedElement) -> Result<(), SchemaViolation> {
    let mut checker = Checker::default();
    match element {
        ShapedElement::Node(node) => checker.node(node),
        ShapedElement::Way(way) => checker.way(way),
    }
    if checker.violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaViolation {
            kind: element.kind(),
            element_id: element.id().map(str::to_owned),
            violations: checker.violations,
        })
    }
}

#[derive(Default)]
struct Checker {
    violations: Vec<FieldViolation>,
}

impl Checker {
    fn node(&mut self, shaped: &ShapedNode) {
        let node = &shaped.node;
        self.required_integer("id", node.id.as_deref());
        self.decimal_in("lat", node.lat.as_deref(), LATITUDE);
        self.decimal_in("lon", node.lon.as_deref(), LONGITUDE);
        self.integer("uid", node.uid.as_deref());
        self.integer("version", node.version.as_deref());
        self.integer("changeset", node.changeset.as_deref());
        self.tags(&shaped.tags);
    }

    fn way(&mut self, shaped: &ShapedWay) {
        let way = &shaped.way;
        self.required_integer("id", way.id.as_deref());
        self.integer("uid", way.uid.as_deref());
        self.integer("version", way.version.as_deref());
        self.integer("changeset", way.changeset.as_deref());
        self.way_nodes(&shaped.nodes);
        self.tags(&shaped.tags);
    }

    fn tags(&mut self, tags: &[TagRecord]) {
        for (index, tag) in tags.iter().enumerate() {
            self.integer(&format!("tags[{index}].owner_id"), tag.owner_id.as_deref());
            self.non_empty(&format!("tags[{index}].key"), &tag.key);
            self.non_empty(&format!("tags[{index}].type"), &tag.kind);
        }
    }

    fn way_nodes(&mut self, nodes: &[WayNodeRecord]) {
        for (index, row) in nodes.iter().enumerate() {
            self.required_integer(&format!("nodes[{index}].node_id"), row.node_id.as_deref());
        }
    }

    fn push(&mut self, field: &str, value: Option<&str>, reason: ViolationReason) {
        self.violations.push(FieldViolation {
            field: field.to_owned(),
            value: value.map(str::to_owned),
            reason,
        });
    }

    fn required_integer(&mut self, field: &str, value: Option<&str>) {
        if value.is_none() {
            self.push(field, None, ViolationReason::Missing);
        } else {
            self.integer(field, value);
        }
    }

    fn integer(&mut self, field: &str, value: Option<&str>) {
        if let Some(raw) = value
            && raw.parse::<i64>().is_err()
        {
            self.push(field, value, ViolationReason::NotInteger);
        }
    }

    fn decimal_in(&mut self, field: &str, value: Option<&str>, range: ViolationReason) {
        let Some(raw) = value else {
            return;
        };
        let ViolationReason::OutOfRange { min, max } = range else {
            return;
        };
        match raw.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() && (min..=max).contains(&parsed) => {}
            Ok(_) => self.push(field, value, range),
            Err(_) => self.push(field, value, ViolationReason::NotDecimal),
        }
    }

    fn non_empty(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            self.push(field, Some(value), ViolationReason::Empty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Attributes, RawElement, RawNode, RawTag, RawWay};
    use crate::shape::Shaper;
    use rstest::{fixture, rstest};

    #[fixture]
    fn shaper() -> Shaper {
        Shaper::default()
    }

    fn attributes(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect()
    }

    fn shape_node(shaper: &Shaper, pairs: &[(&str, &str)], tags: Vec<RawTag>) -> ShapedElement {
        shaper.shape(&RawElement::Node(RawNode {
            attributes: attributes(pairs),
            tags,
        }))
    }

    #[rstest]
    fn accepts_complete_node(shaper: Shaper) {
        let shaped = shape_node(
            &shaper,
            &[
                ("id", "1"),
                ("lat", "37.8"),
                ("lon", "-122.2"),
                ("user", "bob"),
                ("uid", "4"),
                ("version", "2"),
                ("changeset", "99"),
                ("timestamp", "2016-11-30T00:00:00Z"),
            ],
            vec![RawTag::new("addr:postcode", "94610")],
        );
        assert_eq!(validate_element(&shaped), Ok(()));
    }

    #[rstest]
    fn accepts_absent_optional_attributes(shaper: Shaper) {
        let shaped = shape_node(&shaper, &[("id", "1")], Vec::new());
        assert!(validate_element(&shaped).is_ok());
    }

    #[rstest]
    fn reports_every_failed_field(shaper: Shaper) {
        let shaped = shape_node(
            &shaper,
            &[("lat", "north"), ("lon", "200"), ("uid", "x1")],
            Vec::new(),
        );
        let err = validate_element(&shaped).expect_err("node should fail validation");
        let fields: Vec<_> = err
            .violations
            .iter()
            .map(|violation| (violation.field.as_str(), violation.reason))
            .collect();
        assert_eq!(
            fields,
            [
                ("id", ViolationReason::Missing),
                ("lat", ViolationReason::NotDecimal),
                ("lon", LONGITUDE),
                ("uid", ViolationReason::NotInteger),
            ]
        );
        let message = err.to_string();
        assert!(message.contains("element of type 'node'"), "{message}");
        assert!(message.contains("\"north\""), "{message}");
    }

    #[rstest]
    fn way_nodes_require_references(shaper: Shaper) {
        let shaped = shaper.shape(&RawElement::Way(RawWay {
            attributes: attributes(&[("id", "8")]),
            tags: Vec::new(),
            node_refs: vec![Some("1".into()), None, Some("n3".into())],
        }));
        let err = validate_element(&shaped).expect_err("way should fail validation");
        assert_eq!(err.kind, ElementKind::Way);
        assert_eq!(err.element_id.as_deref(), Some("8"));
        let fields: Vec<_> = err
            .violations
            .iter()
            .map(|violation| violation.field.as_str())
            .collect();
        assert_eq!(fields, ["nodes[1].node_id", "nodes[2].node_id"]);
    }

    #[rstest]
    fn empty_tag_type_is_rejected(shaper: Shaper) {
        let shaped = shape_node(&shaper, &[("id", "3")], vec![RawTag::new(":name", "x")]);
        let err = validate_element(&shaped).expect_err("empty type should fail");
        assert_eq!(err.violations[0].field, "tags[0].type");
        assert_eq!(err.violations[0].reason, ViolationReason::Empty);
    }
}
