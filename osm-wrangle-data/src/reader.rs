//! Streaming reader for OpenStreetMap XML extracts.
//!
//! Only one top-level `node` or `way` is buffered at a time. Relations and
//! every other element are skipped, together with their children.
#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use log::{debug, warn};
use osm_wrangle_core::{Attributes, ElementKind, RawElement, RawTag};
use quick_xml::Reader;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// Errors raised while reading an XML extract.
#[derive(Debug, Error)]
pub enum OsmReadError {
    /// The extract could not be opened.
    #[error("failed to open OSM XML file at {path:?}")]
    Open {
        /// Path that failed to open.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not well-formed XML.
    #[error("malformed XML at byte {position} after {elements} element(s)")]
    Xml {
        /// Byte offset reported by the parser.
        position: u64,
        /// Number of complete elements read before the failure.
        elements: u64,
        /// Source error returned by `quick-xml`.
        #[source]
        source: quick_xml::Error,
    },
    /// An attribute could not be parsed.
    #[error("malformed attribute at byte {position} after {elements} element(s)")]
    Attribute {
        /// Byte offset reported by the parser.
        position: u64,
        /// Number of complete elements read before the failure.
        elements: u64,
        /// Source error returned by `quick-xml`.
        #[source]
        source: AttrError,
    },
    /// The document ended inside an element.
    #[error("input ended inside a '{kind}' element after {elements} element(s)")]
    Truncated {
        /// Kind of the unterminated element.
        kind: ElementKind,
        /// Number of complete elements read before the failure.
        elements: u64,
    },
}

/// An element under construction and how deep the parser is inside it.
struct Open {
    element: RawElement,
    depth: usize,
}

/// Pull-based iterator over the `node` and `way` elements of an extract.
///
/// # Examples
/// ```
/// use osm_wrangle_data::OsmXmlReader;
///
/// let xml = r#"<osm>
///   <node id="1" lat="37.8" lon="-122.2"><tag k="amenity" v="cafe"/></node>
///   <relation id="9"><tag k="type" v="route"/></relation>
///   <way id="2"><nd ref="1"/></way>
/// </osm>"#;
/// let elements: Vec<_> = OsmXmlReader::new(xml.as_bytes())
///     .collect::<Result<_, _>>()
///     .expect("well-formed input");
/// assert_eq!(elements.len(), 2);
/// assert_eq!(elements[0].tags()[0].value, "cafe");
/// ```
pub struct OsmXmlReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    open: Option<Open>,
    elements: u64,
    finished: bool,
    name_counts: Option<BTreeMap<String, u64>>,
}

impl OsmXmlReader<BufReader<fs_utf8::File>> {
    /// Open an extract on disk.
    pub fn from_path(path: &Utf8Path) -> Result<Self, OsmReadError> {
        let file = osm_wrangle_fs::open_utf8_file(path).map_err(|source| OsmReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> OsmXmlReader<R> {
    /// Wrap a buffered source.
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            open: None,
            elements: 0,
            finished: false,
            name_counts: None,
        }
    }

    /// Also count every XML element name seen, at any depth, including the
    /// ones that are skipped.
    #[must_use]
    pub fn counting_names(mut self) -> Self {
        if self.name_counts.is_none() {
            self.name_counts = Some(BTreeMap::new());
        }
        self
    }

    /// Element name counts so far, when enabled with
    /// [`counting_names`](Self::counting_names).
    #[must_use]
    pub const fn name_counts(&self) -> Option<&BTreeMap<String, u64>> {
        self.name_counts.as_ref()
    }

    /// Number of complete elements returned so far.
    #[must_use]
    pub const fn elements_read(&self) -> u64 {
        self.elements
    }

    /// Read the next complete element, or `None` at the end of the document.
    pub fn next_element(&mut self) -> Result<Option<RawElement>, OsmReadError> {
        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            let elements = self.elements;
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|source| OsmReadError::Xml {
                    position,
                    elements,
                    source,
                })?;
            let complete = match event {
                Event::Start(start) => {
                    tally_name(self.name_counts.as_mut(), &start);
                    open_child(&mut self.open, &start, false, position, elements)?
                }
                Event::Empty(start) => {
                    tally_name(self.name_counts.as_mut(), &start);
                    open_child(&mut self.open, &start, true, position, elements)?
                }
                Event::End(_) => close_child(&mut self.open),
                Event::Eof => {
                    if let Some(open) = self.open.take() {
                        return Err(OsmReadError::Truncated {
                            kind: open.element.kind(),
                            elements,
                        });
                    }
                    return Ok(None);
                }
                _ => None,
            };
            if let Some(element) = complete {
                self.elements += 1;
                return Ok(Some(element));
            }
        }
    }
}

impl<R: BufRead> Iterator for OsmXmlReader<R> {
    type Item = Result<RawElement, OsmReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let outcome = self.next_element();
        if !matches!(outcome, Ok(Some(_))) {
            self.finished = true;
        }
        outcome.transpose()
    }
}

fn tally_name(counts: Option<&mut BTreeMap<String, u64>>, start: &BytesStart<'_>) {
    let Some(tally) = counts else {
        return;
    };
    let qname = start.name();
    let name = String::from_utf8_lossy(qname.as_ref());
    if let Some(count) = tally.get_mut(&*name) {
        *count += 1;
    } else {
        tally.insert(name.into_owned(), 1);
    }
}

/// Handle a start or empty tag. Returns the element when an empty top-level
/// `node` or `way` completes immediately.
fn open_child(
    open: &mut Option<Open>,
    start: &BytesStart<'_>,
    empty: bool,
    position: u64,
    elements: u64,
) -> Result<Option<RawElement>, OsmReadError> {
    let name = start.name();
    if open.is_none() {
        let Some(kind) = ElementKind::from_name(name.as_ref()) else {
            return Ok(None);
        };
        let element = RawElement::empty(kind, read_attributes(start, position, elements)?);
        if empty {
            return Ok(Some(element));
        }
        *open = Some(Open { element, depth: 0 });
        return Ok(None);
    }
    let Some(current) = open.as_mut() else {
        return Ok(None);
    };

    match name.as_ref() {
        b"tag" => {
            let mut attributes = read_attributes(start, position, elements)?;
            let key = attributes.remove("k").unwrap_or_default();
            let value = attributes.remove("v").unwrap_or_default();
            current.element.push_tag(RawTag { key, value });
        }
        b"nd" => {
            let node_ref = read_attributes(start, position, elements)?.remove("ref");
            if node_ref.is_none() {
                warn!(
                    "nd without ref in {} {:?}",
                    current.element.kind(),
                    current.element.attributes().get("id")
                );
            }
            if !current.element.push_node_ref(node_ref) {
                debug!("Ignored nd child of a node element");
            }
        }
        _ => {}
    }
    if !empty {
        current.depth += 1;
    }
    Ok(None)
}

/// Handle an end tag. Returns the element when its own end tag is reached.
fn close_child(open: &mut Option<Open>) -> Option<RawElement> {
    let current = open.as_mut()?;
    if current.depth == 0 {
        return open.take().map(|done| done.element);
    }
    current.depth -= 1;
    None
}

fn read_attributes(
    start: &BytesStart<'_>,
    position: u64,
    elements: u64,
) -> Result<Attributes, OsmReadError> {
    let mut attributes = Attributes::new();
    for entry in start.attributes() {
        let attribute = entry.map_err(|source| OsmReadError::Attribute {
            position,
            elements,
            source,
        })?;
        let value = attribute
            .unescape_value()
            .map_err(|source| OsmReadError::Xml {
                position,
                elements,
                source,
            })?;
        attributes.insert(
            String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
            value.into_owned(),
        );
    }
    Ok(attributes)
}
