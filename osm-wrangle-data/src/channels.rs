//! The five CSV output channels and their on-disk locations.
#![forbid(unsafe_code)]

use std::fmt;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use osm_wrangle_core::{
    NODE_FIELDS, ShapedElement, ShapedNode, ShapedWay, TAG_FIELDS, WAY_FIELDS, WAY_NODE_FIELDS,
};
use serde::Serialize;
use thiserror::Error;

/// One of the five output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Core node attributes.
    Nodes,
    /// Tags owned by nodes.
    NodeTags,
    /// Core way attributes.
    Ways,
    /// Ordered node references of ways.
    WayNodes,
    /// Tags owned by ways.
    WayTags,
}

impl Channel {
    /// Every channel, in load order.
    pub const ALL: [Self; 5] = [
        Self::Nodes,
        Self::NodeTags,
        Self::Ways,
        Self::WayNodes,
        Self::WayTags,
    ];

    /// Name shared by the CSV file stem and the SQLite table.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::NodeTags => "nodes_tags",
            Self::Ways => "ways",
            Self::WayNodes => "ways_nodes",
            Self::WayTags => "ways_tags",
        }
    }

    /// Default file name inside an output directory.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }

    /// Header row, which is also the column order.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Nodes => &NODE_FIELDS,
            Self::Ways => &WAY_FIELDS,
            Self::NodeTags | Self::WayTags => &TAG_FIELDS,
            Self::WayNodes => &WAY_NODE_FIELDS,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value held for each of the five channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PerChannel<T> {
    /// Value for [`Channel::Nodes`].
    pub nodes: T,
    /// Value for [`Channel::NodeTags`].
    pub nodes_tags: T,
    /// Value for [`Channel::Ways`].
    pub ways: T,
    /// Value for [`Channel::WayNodes`].
    pub ways_nodes: T,
    /// Value for [`Channel::WayTags`].
    pub ways_tags: T,
}

impl<T> PerChannel<T> {
    /// Build each value from its channel.
    pub fn from_fn(mut build: impl FnMut(Channel) -> T) -> Self {
        Self {
            nodes: build(Channel::Nodes),
            nodes_tags: build(Channel::NodeTags),
            ways: build(Channel::Ways),
            ways_nodes: build(Channel::WayNodes),
            ways_tags: build(Channel::WayTags),
        }
    }

    /// Build each value from its channel, stopping at the first error.
    pub fn try_from_fn<E>(mut build: impl FnMut(Channel) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            nodes: build(Channel::Nodes)?,
            nodes_tags: build(Channel::NodeTags)?,
            ways: build(Channel::Ways)?,
            ways_nodes: build(Channel::WayNodes)?,
            ways_tags: build(Channel::WayTags)?,
        })
    }

    /// Borrow the value for `channel`.
    #[must_use]
    pub const fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::Nodes => &self.nodes,
            Channel::NodeTags => &self.nodes_tags,
            Channel::Ways => &self.ways,
            Channel::WayNodes => &self.ways_nodes,
            Channel::WayTags => &self.ways_tags,
        }
    }

    /// Mutably borrow the value for `channel`.
    pub const fn get_mut(&mut self, channel: Channel) -> &mut T {
        match channel {
            Channel::Nodes => &mut self.nodes,
            Channel::NodeTags => &mut self.nodes_tags,
            Channel::Ways => &mut self.ways,
            Channel::WayNodes => &mut self.ways_nodes,
            Channel::WayTags => &mut self.ways_tags,
        }
    }

    /// Pair every channel with its value, in [`Channel::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &T)> {
        Channel::ALL.into_iter().map(|channel| (channel, self.get(channel)))
    }

    /// Consume the set, pairing every channel with its value.
    pub fn into_array(self) -> [(Channel, T); 5] {
        [
            (Channel::Nodes, self.nodes),
            (Channel::NodeTags, self.nodes_tags),
            (Channel::Ways, self.ways),
            (Channel::WayNodes, self.ways_nodes),
            (Channel::WayTags, self.ways_tags),
        ]
    }

    /// Transform every value.
    pub fn map<U>(self, mut apply: impl FnMut(T) -> U) -> PerChannel<U> {
        PerChannel {
            nodes: apply(self.nodes),
            nodes_tags: apply(self.nodes_tags),
            ways: apply(self.ways),
            ways_nodes: apply(self.ways_nodes),
            ways_tags: apply(self.ways_tags),
        }
    }

    /// Transform every value, stopping at the first error.
    pub fn try_map<U, E>(
        self,
        mut apply: impl FnMut(Channel, T) -> Result<U, E>,
    ) -> Result<PerChannel<U>, E> {
        Ok(PerChannel {
            nodes: apply(Channel::Nodes, self.nodes)?,
            nodes_tags: apply(Channel::NodeTags, self.nodes_tags)?,
            ways: apply(Channel::Ways, self.ways)?,
            ways_nodes: apply(Channel::WayNodes, self.ways_nodes)?,
            ways_tags: apply(Channel::WayTags, self.ways_tags)?,
        })
    }
}

/// Row counts per channel.
pub type RowCounts = PerChannel<u64>;

/// Locations of the five CSV files.
pub type OutputPaths = PerChannel<Utf8PathBuf>;

impl OutputPaths {
    /// The default file names (`nodes.csv`, `nodes_tags.csv`, ...) inside
    /// `dir`.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8Path;
    /// use osm_wrangle_data::OutputPaths;
    ///
    /// let paths = OutputPaths::in_dir(Utf8Path::new("out"));
    /// assert_eq!(paths.ways_nodes, "out/ways_nodes.csv");
    /// ```
    #[must_use]
    pub fn in_dir(dir: &Utf8Path) -> Self {
        Self::from_fn(|channel| dir.join(channel.file_name()))
    }
}

/// A CSV write failed.
#[derive(Debug, Error)]
#[error("failed to write {channel} CSV")]
pub struct ChannelError {
    /// Channel whose write failed.
    pub channel: Channel,
    /// Source error returned by `csv`.
    #[source]
    pub source: csv::Error,
}

/// CSV writers for all five channels.
///
/// Headers are written on construction, so every channel carries a header
/// row even when no element produced data for it.
///
/// # Examples
/// ```
/// use osm_wrangle_data::{CsvChannels, PerChannel};
///
/// let sinks = PerChannel::from_fn(|_| Vec::<u8>::new());
/// let channels = CsvChannels::new(sinks).expect("write headers");
/// let buffers = channels.finish().expect("flush channels");
/// assert_eq!(buffers.ways_nodes, b"way_id,node_id,position\n");
/// ```
pub struct CsvChannels<W: Write> {
    writers: PerChannel<csv::Writer<W>>,
    rows: RowCounts,
}

impl<W: Write> CsvChannels<W> {
    /// Wrap one sink per channel and write the header rows.
    pub fn new(sinks: PerChannel<W>) -> Result<Self, ChannelError> {
        let mut writers = sinks.map(csv_writer);
        for channel in Channel::ALL {
            writers
                .get_mut(channel)
                .write_record(channel.columns())
                .map_err(|source| ChannelError { channel, source })?;
        }
        Ok(Self {
            writers,
            rows: RowCounts::default(),
        })
    }

    /// Write every row of a shaped element.
    pub fn write(&mut self, element: &ShapedElement) -> Result<(), ChannelError> {
        match element {
            ShapedElement::Node(node) => self.write_node(node),
            ShapedElement::Way(way) => self.write_way(way),
        }
    }

    /// Write a node row followed by its tag rows.
    pub fn write_node(&mut self, shaped: &ShapedNode) -> Result<(), ChannelError> {
        self.write_row(Channel::Nodes, shaped.node.encoded())?;
        for tag in &shaped.tags {
            self.write_row(Channel::NodeTags, tag.encoded())?;
        }
        Ok(())
    }

    /// Write a way row followed by its way-node and tag rows.
    pub fn write_way(&mut self, shaped: &ShapedWay) -> Result<(), ChannelError> {
        self.write_row(Channel::Ways, shaped.way.encoded())?;
        for node in &shaped.nodes {
            self.write_row(Channel::WayNodes, node.encoded())?;
        }
        for tag in &shaped.tags {
            self.write_row(Channel::WayTags, tag.encoded())?;
        }
        Ok(())
    }

    /// Data rows written so far, headers excluded.
    #[must_use]
    pub const fn rows(&self) -> &RowCounts {
        &self.rows
    }

    /// Flush every channel and hand back the underlying sinks.
    pub fn finish(self) -> Result<PerChannel<W>, ChannelError> {
        self.writers.try_map(|channel, writer| {
            writer.into_inner().map_err(|err| ChannelError {
                channel,
                source: csv::Error::from(err.into_error()),
            })
        })
    }

    fn write_row<I>(&mut self, channel: Channel, row: I) -> Result<(), ChannelError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.writers
            .get_mut(channel)
            .write_record(row)
            .map_err(|source| ChannelError { channel, source })?;
        *self.rows.get_mut(channel) += 1;
        Ok(())
    }
}

fn csv_writer<W: Write>(sink: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use osm_wrangle_core::{Attributes, RawElement, RawNode, RawTag, RawWay, Shaper};
    use rstest::{fixture, rstest};

    #[fixture]
    fn channels() -> CsvChannels<Vec<u8>> {
        CsvChannels::new(PerChannel::from_fn(|_| Vec::new())).expect("write headers")
    }

    fn text(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes).expect("CSV output is UTF-8")
    }

    #[rstest]
    fn headers_are_written_without_rows(channels: CsvChannels<Vec<u8>>) {
        let buffers = channels.finish().expect("flush channels");
        assert_eq!(
            text(&buffers.nodes),
            "id,lat,lon,user,uid,version,changeset,timestamp\n"
        );
        assert_eq!(text(&buffers.nodes_tags), "owner_id,key,type,value\n");
        assert_eq!(text(&buffers.ways), "id,user,uid,version,changeset,timestamp\n");
        assert_eq!(text(&buffers.ways_tags), "owner_id,key,type,value\n");
    }

    #[rstest]
    fn rows_route_to_their_channels(mut channels: CsvChannels<Vec<u8>>) {
        let shaper = Shaper::default();
        let node = RawElement::Node(RawNode {
            attributes: Attributes::from([
                ("id".into(), "1".into()),
                ("lat".into(), "37.8".into()),
            ]),
            tags: vec![RawTag::new("name", "Lake Merritt, Oakland")],
        });
        let way = RawElement::Way(RawWay {
            attributes: Attributes::from([("id".into(), "2".into())]),
            tags: vec![RawTag::new("addr:street", "Grand Ave")],
            node_refs: vec![Some("1".into()), Some("3".into())],
        });
        channels.write(&shaper.shape(&node)).expect("write node");
        channels.write(&shaper.shape(&way)).expect("write way");

        assert_eq!(
            channels.rows(),
            &RowCounts {
                nodes: 1,
                nodes_tags: 1,
                ways: 1,
                ways_nodes: 2,
                ways_tags: 1,
            }
        );
        let buffers = channels.finish().expect("flush channels");
        assert!(
            text(&buffers.nodes)
                .ends_with("1,37.8,99999999,99999999,99999999,99999999,99999999,99999999\n")
        );
        assert!(text(&buffers.nodes_tags).ends_with("1,name,regular,\"Lake Merritt, Oakland\"\n"));
        assert!(text(&buffers.ways_nodes).ends_with("2,1,0\n2,3,1\n"));
        assert!(text(&buffers.ways_tags).ends_with("2,street,addr,Grand Avenue\n"));
    }

    #[rstest]
    fn default_paths_use_channel_names() {
        let paths = OutputPaths::in_dir(Utf8Path::new("/tmp/out"));
        let names: Vec<_> = paths.iter().map(|(_, path)| path.as_str()).collect();
        assert_eq!(
            names,
            [
                "/tmp/out/nodes.csv",
                "/tmp/out/nodes_tags.csv",
                "/tmp/out/ways.csv",
                "/tmp/out/ways_nodes.csv",
                "/tmp/out/ways_tags.csv",
            ]
        );
    }
}
