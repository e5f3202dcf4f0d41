//! Raw OpenStreetMap elements as read from the XML extract.
//!
//! Only `node` and `way` elements are modelled; everything else is filtered
//! out by the reader before it reaches this type.

use std::collections::BTreeMap;
use std::fmt;

/// The two element kinds the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A single geographic point.
    Node,
    /// An ordered path or polygon over nodes.
    Way,
}

impl ElementKind {
    /// The XML element name for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
        }
    }

    /// Resolve an XML element name, returning `None` for anything else.
    #[must_use]
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(Self::Node),
            b"way" => Some(Self::Way),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute name to value, exactly as they appeared on the element.
pub type Attributes = BTreeMap<String, String>;

/// A child `tag` element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTag {
    /// The `k` attribute; empty when absent.
    pub key: String,
    /// The `v` attribute; empty when absent.
    pub value: String,
}

impl RawTag {
    /// Build a tag from its key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A `node` element with its child tags in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawNode {
    /// Attributes of the `node` element.
    pub attributes: Attributes,
    /// Child `tag` elements.
    pub tags: Vec<RawTag>,
}

/// A `way` element with its child tags and node references in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawWay {
    /// Attributes of the `way` element.
    pub attributes: Attributes,
    /// Child `tag` elements.
    pub tags: Vec<RawTag>,
    /// The `ref` attribute of each child `nd` element; `None` when absent.
    pub node_refs: Vec<Option<String>>,
}

/// One top-level element of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawElement {
    /// A `node` element.
    Node(RawNode),
    /// A `way` element.
    Way(RawWay),
}

impl RawElement {
    /// Start an empty element of the given kind.
    #[must_use]
    pub fn empty(kind: ElementKind, attributes: Attributes) -> Self {
        match kind {
            ElementKind::Node => Self::Node(RawNode {
                attributes,
                tags: Vec::new(),
            }),
            ElementKind::Way => Self::Way(RawWay {
                attributes,
                tags: Vec::new(),
                node_refs: Vec::new(),
            }),
        }
    }

    /// The element kind.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Node(_) => ElementKind::Node,
            Self::Way(_) => ElementKind::Way,
        }
    }

    /// The element attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        match self {
            Self::Node(node) => &node.attributes,
            Self::Way(way) => &way.attributes,
        }
    }

    /// The child tags in document order.
    #[must_use]
    pub fn tags(&self) -> &[RawTag] {
        match self {
            Self::Node(node) => &node.tags,
            Self::Way(way) => &way.tags,
        }
    }

    /// Append a child tag.
    pub fn push_tag(&mut self, tag: RawTag) {
        match self {
            Self::Node(node) => node.tags.push(tag),
            Self::Way(way) => way.tags.push(tag),
        }
    }

    /// Append a child node reference. Nodes carry no references, so the call
    /// is ignored for them and `false` is returned.
    pub fn push_node_ref(&mut self, node_ref: Option<String>) -> bool {
        match self {
            Self::Node(_) => false,
            Self::Way(way) => {
                way.node_refs.push(node_ref);
                true
            }
        }
    }
}
