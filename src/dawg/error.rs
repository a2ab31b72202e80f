use thiserror::Error;

/// A [`Layout`](super::layout::Layout) that cannot describe a packed record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Labels must hold at least one byte.
    #[error("label width must be at least 1 byte")]
    ZeroLabelWidth,
    /// The label width is stored in a single header byte.
    #[error("label width {0} does not fit in a byte")]
    LabelWidthTooLarge(usize),
    /// The inline edge capacity is stored in a single header byte.
    #[error("inline edge capacity {0} does not fit in a byte")]
    InlineEdgesTooLarge(usize),
    /// NUL pads short labels, so it cannot also terminate words.
    #[error("the NUL byte cannot be used as the word sentinel")]
    NulSentinel,
    /// Index widths are 1, 2 or 4 bytes.
    #[error("unsupported index width of {0} bytes")]
    UnsupportedIndexWidth(u8),
}

/// Errors that can occur while building a packed word graph.
///
/// Every variant is fatal: a build that fails produces no output at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    /// A word is longer than the configured maximum.
    #[error("word {word:?} is {len} bytes long, the limit is {max}")]
    InputTooLong {
        /// The offending word, lossily decoded.
        word: String,
        /// Its length in bytes.
        len: usize,
        /// The configured limit.
        max: usize,
    },
    /// A word contains the NUL byte or the sentinel.
    #[error("word {word:?} contains the reserved byte {byte:#04x}")]
    ReservedByte {
        /// The offending word, lossily decoded.
        word: String,
        /// The reserved byte that was found.
        byte: u8,
    },
    /// A slot index does not fit in the configured index width.
    #[error("slot {index} cannot be addressed with {width}-byte indices")]
    IndexOverflow {
        /// The first slot index that did not fit.
        index: usize,
        /// The index width in bytes.
        width: usize,
    },
    /// A node has more children than a record's edge count byte can hold.
    #[error("a node with {count} edges cannot be packed, the limit is 255")]
    TooManyEdges {
        /// Number of outgoing edges of the node.
        count: usize,
    },
    /// A label is wider than the record's label field; the trie was not normalized.
    #[error("label of {len} bytes does not fit a {width}-byte label field")]
    LabelTooWide {
        /// Label length in bytes.
        len: usize,
        /// Label field width in bytes.
        width: usize,
    },
    /// A count does not fit its 32-bit container header field.
    #[error("{field} of {value} does not fit in a 32-bit container field")]
    CountOverflow {
        /// Name of the header field.
        field: &'static str,
        /// The count that did not fit.
        value: usize,
    },
    /// The configured layout is unusable.
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),
}

/// Errors reported when a blob does not hold a well-formed packed word graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The blob has no records; even an empty word list has a root.
    #[error("blob holds no records")]
    Empty,
    /// The blob is not a whole number of records.
    #[error("blob of {len} bytes is not a multiple of the {record_size}-byte record size")]
    Misaligned {
        /// Blob length in bytes.
        len: usize,
        /// Record size in bytes.
        record_size: usize,
    },
    /// An edge points past the end of the record array.
    #[error("record {slot} has an edge to slot {target}, but the blob only has {slots} slots")]
    EdgeOutOfBounds {
        /// Slot of the record holding the edge.
        slot: usize,
        /// Slot the edge points to.
        target: usize,
        /// Number of slots in the blob.
        slots: usize,
    },
    /// A record's overflow edges run past the end of the blob.
    #[error("record {slot} needs {needed} slots, but the blob only has {slots}")]
    TruncatedRecord {
        /// Slot of the record.
        slot: usize,
        /// Slots the record spans including overflow.
        needed: usize,
        /// Number of slots in the blob.
        slots: usize,
    },
    /// An edge points at a slot reserved for another record's overflow edges.
    #[error("record {slot} references slot {target}, which holds overflow edges")]
    OverflowReferenced {
        /// Slot of the record holding the edge.
        slot: usize,
        /// The overflow slot that was referenced.
        target: usize,
    },
    /// A record whose label ends a word has outgoing edges.
    #[error("record {slot} ends a word but has {edges} edges")]
    TerminatorWithEdges {
        /// Slot of the record.
        slot: usize,
        /// Its edge count.
        edges: usize,
    },
    /// A leaf other than the root does not end a word.
    #[error("record {slot} is a leaf that does not end a word")]
    UnterminatedLeaf {
        /// Slot of the record.
        slot: usize,
    },
    /// Following edges leads back to a record already on the path.
    #[error("edges form a cycle through record {slot}")]
    Cycle {
        /// Slot where the cycle was detected.
        slot: usize,
    },
    /// The container does not start with the expected magic bytes.
    #[error("not a packed word graph container")]
    BadMagic,
    /// The container was written by an incompatible version.
    #[error("unsupported container version {0}")]
    UnsupportedVersion(u8),
    /// The container is shorter than its header says.
    #[error("container of {len} bytes is truncated, {needed} bytes expected")]
    Truncated {
        /// Actual length in bytes.
        len: usize,
        /// Length implied by the header.
        needed: usize,
    },
    /// The container holds bytes past the records its header describes.
    #[error("container of {len} bytes has trailing data, {expected} bytes expected")]
    TrailingBytes {
        /// Actual length in bytes.
        len: usize,
        /// Length implied by the header.
        expected: usize,
    },
    /// The record checksum does not match the header.
    #[error("checksum mismatch: header says {stored:#010x}, records hash to {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        stored: u32,
        /// Checksum of the record bytes.
        computed: u32,
    },
    /// The layout stored in or passed with the blob is unusable.
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),
}
