//! Element shaping: one raw element in, one set of normalised rows out.

use crate::clean::CleaningRules;
use crate::element::{ElementKind, RawElement, RawNode, RawTag, RawWay};
use crate::record::{NodeRecord, TagRecord, WayNodeRecord, WayRecord};
use crate::tags::flatten_tag;

/// Rows derived from a `node` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedNode {
    /// Core attributes.
    pub node: NodeRecord,
    /// Kept tags in document order.
    pub tags: Vec<TagRecord>,
}

/// Rows derived from a `way` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedWay {
    /// Core attributes.
    pub way: WayRecord,
    /// Node references with contiguous positions starting at zero.
    pub nodes: Vec<WayNodeRecord>,
    /// Kept tags in document order.
    pub tags: Vec<TagRecord>,
}

/// The shaped form of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapedElement {
    /// Rows for the node channels.
    Node(ShapedNode),
    /// Rows for the way channels.
    Way(ShapedWay),
}

impl ShapedElement {
    /// The element kind these rows came from.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Node(_) => ElementKind::Node,
            Self::Way(_) => ElementKind::Way,
        }
    }

    /// Identifier of the source element, if it had one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Node(shaped) => shaped.node.id.as_deref(),
            Self::Way(shaped) => shaped.way.id.as_deref(),
        }
    }
}

/// Converts raw elements into normalised rows using a fixed set of rules.
///
/// Shaping holds no state between elements; the same element always yields
/// the same rows.
///
/// # Examples
/// ```
/// use osm_wrangle_core::{Attributes, RawElement, RawTag, RawWay, ShapedElement, Shaper};
///
/// let way = RawWay {
///     attributes: Attributes::from([("id".into(), "5".into())]),
///     tags: vec![RawTag::new("addr:street", "Main St")],
///     node_refs: vec![Some("1".into()), Some("2".into())],
/// };
/// let shaper = Shaper::default();
/// let ShapedElement::Way(shaped) = shaper.shape(&RawElement::Way(way)) else {
///     unreachable!("ways shape into ways");
/// };
/// assert_eq!(shaped.tags[0].value, "Main Street");
/// assert_eq!(shaped.nodes[1].position, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Shaper {
    rules: CleaningRules,
}

impl Shaper {
    /// Build a shaper over the supplied cleaning rules.
    #[must_use]
    pub const fn new(rules: CleaningRules) -> Self {
        Self { rules }
    }

    /// Shape one element.
    #[must_use]
    pub fn shape(&self, element: &RawElement) -> ShapedElement {
        match element {
            RawElement::Node(node) => ShapedElement::Node(self.shape_node(node)),
            RawElement::Way(way) => ShapedElement::Way(self.shape_way(way)),
        }
    }

    /// Shape a `node` element.
    #[must_use]
    pub fn shape_node(&self, node: &RawNode) -> ShapedNode {
        let record = NodeRecord::from_attributes(&node.attributes);
        let tags = self.flatten_all(ElementKind::Node, record.id.as_deref(), &node.tags);
        ShapedNode { node: record, tags }
    }

    /// Shape a `way` element.
    #[must_use]
    pub fn shape_way(&self, way: &RawWay) -> ShapedWay {
        let record = WayRecord::from_attributes(&way.attributes);
        let tags = self.flatten_all(ElementKind::Way, record.id.as_deref(), &way.tags);
        let nodes = way
            .node_refs
            .iter()
            .enumerate()
            .map(|(position, node_id)| WayNodeRecord {
                way_id: record.id.clone(),
                node_id: node_id.clone(),
                position,
            })
            .collect();
        ShapedWay {
            way: record,
            nodes,
            tags,
        }
    }

    fn flatten_all(
        &self,
        owner: ElementKind,
        owner_id: Option<&str>,
        tags: &[RawTag],
    ) -> Vec<TagRecord> {
        tags.iter()
            .filter_map(|tag| flatten_tag(&self.rules, owner, owner_id, tag))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Attributes;
    use crate::record::PLACEHOLDER;
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

    #[fixture]
    fn node() -> RawNode {
        RawNode {
            attributes: attributes(&[
                ("id", "261114295"),
                ("lat", "37.8066"),
                ("lon", "-122.2711"),
                ("user", "alice"),
                ("uid", "12"),
                ("version", "3"),
                ("changeset", "9911"),
                ("timestamp", "2016-01-02T03:04:05Z"),
            ]),
            tags: vec![
                RawTag::new("amenity", "cafe"),
                RawTag::new("addr:city", "oakland"),
                RawTag::new("addr:postcode", "946ca"),
                RawTag::new("bad,key", "x"),
                RawTag::new("addr:street", "Broadway"),
            ],
        }
    }

    #[rstest]
    fn node_keeps_core_attributes(shaper: Shaper, node: RawNode) {
        let shaped = shaper.shape_node(&node);
        assert_eq!(shaped.node.id.as_deref(), Some("261114295"));
        assert_eq!(shaped.node.lon.as_deref(), Some("-122.2711"));
        assert_eq!(
            shaped.node.timestamp.as_deref(),
            Some("2016-01-02T03:04:05Z")
        );
    }

    #[rstest]
    fn node_tags_are_filtered_and_ordered(shaper: Shaper, node: RawNode) {
        let shaped = shaper.shape_node(&node);
        let keys: Vec<_> = shaped.tags.iter().map(|tag| tag.key.as_str()).collect();
        assert_eq!(keys, ["amenity", "city", "street"]);
        assert!(
            shaped
                .tags
                .iter()
                .all(|tag| tag.owner_id.as_deref() == Some("261114295"))
        );
    }

    #[rstest]
    fn missing_attributes_stay_absent(shaper: Shaper) {
        let shaped = shaper.shape_node(&RawNode {
            attributes: attributes(&[("id", "1")]),
            tags: Vec::new(),
        });
        assert_eq!(shaped.node.lat, None);
        assert_eq!(shaped.node.encoded()[1], PLACEHOLDER);
    }

    #[rstest]
    fn way_positions_follow_document_order(shaper: Shaper) {
        let way = RawWay {
            attributes: attributes(&[("id", "77")]),
            tags: vec![RawTag::new("highway", "residential")],
            node_refs: vec![Some("3".into()), Some("1".into()), Some("2".into())],
        };
        let shaped = shaper.shape_way(&way);
        let rows: Vec<_> = shaped
            .nodes
            .iter()
            .map(|row| (row.node_id.as_deref(), row.position))
            .collect();
        assert_eq!(rows, [(Some("3"), 0), (Some("1"), 1), (Some("2"), 2)]);
        assert!(
            shaped
                .nodes
                .iter()
                .all(|row| row.way_id.as_deref() == Some("77"))
        );
        assert_eq!(shaped.tags.len(), 1);
    }

    #[rstest]
    fn way_without_references_has_no_way_nodes(shaper: Shaper) {
        let shaped = shaper.shape(&RawElement::Way(RawWay::default()));
        let ShapedElement::Way(way) = shaped else {
            panic!("expected a shaped way");
        };
        assert!(way.nodes.is_empty());
        assert_eq!(way.way.id, None);
    }

    #[rstest]
    fn shaping_is_deterministic(shaper: Shaper, node: RawNode) {
        let element = RawElement::Node(node);
        assert_eq!(shaper.shape(&element), shaper.shape(&element));
    }
}
