use log::{debug, info};
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::container;
use super::dedup::{MergePolicy, DEFAULT_MAX_ROUNDS};
use super::error::{BuilderError, DecodeError};
use super::label;
use super::layout::Layout;
use super::reader::WordList;
use super::trie::Trie;

/// Longest word accepted by the default configuration, in bytes.
pub const DEFAULT_MAX_WORD_LEN: usize = 28;

/// Trait for types that can be used as a word when building a word list.
///
/// Implemented for common string and byte sequence types so that
/// [`Builder::add_word`] and [`build_wordlist`] accept them directly.
pub trait IntoWord {
    /// Collects this word into a byte buffer.
    fn collect_word(self) -> SmallVec<[u8; 32]>;
}

// String types

impl IntoWord for &str {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self.as_bytes())
    }
}

impl IntoWord for &&str {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self.as_bytes())
    }
}

impl IntoWord for String {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_vec(self.into_bytes())
    }
}

impl IntoWord for &String {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self.as_bytes())
    }
}

// Byte sequences

impl IntoWord for &[u8] {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self)
    }
}

impl IntoWord for Vec<u8> {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_vec(self)
    }
}

impl IntoWord for &Vec<u8> {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self)
    }
}

impl<const N: usize> IntoWord for [u8; N] {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(&self)
    }
}

impl<const N: usize> IntoWord for &[u8; N] {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self)
    }
}

/// Settings for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildConfig {
    /// Record layout of the output.
    pub layout: Layout,
    /// Longest accepted word in bytes, not counting the sentinel.
    pub max_word_len: usize,
    /// Cap on merge rounds. Zero packs the plain trie.
    pub max_rounds: usize,
    /// How fingerprint matches are merged.
    pub merge: MergePolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            layout: Layout::default(),
            max_word_len: DEFAULT_MAX_WORD_LEN,
            max_rounds: DEFAULT_MAX_ROUNDS,
            merge: MergePolicy::default(),
        }
    }
}

/// Numbers describing a finished build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuildStats {
    /// Distinct words stored.
    pub words: usize,
    /// Nodes of the normalized trie before merging.
    pub trie_nodes: usize,
    /// Distinct nodes left after merging; one record each.
    pub dag_nodes: usize,
    /// Merge rounds that changed the graph.
    pub dedup_rounds: usize,
    /// Edges redirected while merging.
    pub merged_edges: usize,
    /// Record slots written, overflow slots included.
    pub slots: usize,
    /// Slots holding only overflow edges.
    pub overflow_slots: usize,
    /// Size of the record array in bytes.
    pub bytes: usize,
    /// `edge_histogram[n]` is the number of nodes with `n` outgoing edges.
    pub edge_histogram: Vec<usize>,
    /// `label_histogram[n]` is the number of nodes with an `n`-byte label.
    pub label_histogram: Vec<usize>,
}

/// A builder for packed word lists.
///
/// Words can be added in any order; duplicates are ignored. [`build`](Builder::build)
/// normalizes the trie, merges identical subtrees and packs the result.
#[derive(Debug, Clone)]
pub struct Builder {
    config: BuildConfig,
    trie: Trie,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        let config = BuildConfig::default();
        Builder {
            trie: Trie::new(config.layout.sentinel),
            config,
        }
    }

    /// Creates a builder with `config`, rejecting unusable layouts up front.
    pub fn with_config(config: BuildConfig) -> Result<Self, BuilderError> {
        config.layout.validate()?;
        Ok(Builder {
            trie: Trie::new(config.layout.sentinel),
            config,
        })
    }

    /// The configuration this builder was created with.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Distinct words added so far.
    pub fn word_count(&self) -> usize {
        self.trie.word_count()
    }

    /// Adds a word.
    ///
    /// Returns `false` if the word was already present.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::InputTooLong`] if the word exceeds the configured
    /// maximum and [`BuilderError::ReservedByte`] if it contains NUL or the sentinel.
    pub fn add_word(&mut self, word: impl IntoWord) -> Result<bool, BuilderError> {
        let word = word.collect_word();
        let text = label::terminate(&word, self.config.layout.sentinel, self.config.max_word_len)?;
        Ok(self.trie.insert_terminated(&text))
    }

    /// Normalizes, merges and packs the words added so far.
    ///
    /// Fails without producing output if the graph cannot be addressed with the
    /// configured index width.
    pub fn build(self) -> Result<Packed, BuilderError> {
        let Builder { config, mut trie } = self;
        let layout = config.layout;
        debug!("building from {} words", trie.word_count());

        let split = trie.split_long_labels(layout.label_width);
        debug!("split long labels into {split} extra nodes");
        trie.sort_children();
        let trie_nodes = trie.reachable_count();

        let report = trie.deduplicate(config.merge, config.max_rounds);
        let out = trie.pack(&layout)?;

        let mut stats = BuildStats {
            words: trie.word_count(),
            trie_nodes,
            dag_nodes: out.nodes,
            dedup_rounds: report.rounds,
            merged_edges: report.merged_edges,
            slots: out.slots,
            overflow_slots: out.overflow_slots,
            bytes: out.records.len(),
            edge_histogram: Vec::new(),
            label_histogram: vec![0; layout.label_width + 1],
        };
        for id in trie.reachable() {
            let node = trie.node(id);
            let edges = node.child_count();
            if stats.edge_histogram.len() <= edges {
                stats.edge_histogram.resize(edges + 1, 0);
            }
            stats.edge_histogram[edges] += 1;
            stats.label_histogram[node.label().len()] += 1;
        }
        info!(
            "packed {} words: {} trie nodes, {} graph nodes, {} slots, {} bytes",
            stats.words, stats.trie_nodes, stats.dag_nodes, stats.slots, stats.bytes
        );

        Ok(Packed {
            records: out.records,
            layout,
            stats,
        })
    }
}

/// The output of a build: the record array, its layout and build statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packed {
    records: Vec<u8>,
    layout: Layout,
    stats: BuildStats,
}

impl Packed {
    /// The raw record array.
    pub fn as_bytes(&self) -> &[u8] {
        &self.records
    }

    /// Takes the raw record array.
    pub fn into_bytes(self) -> Vec<u8> {
        self.records
    }

    /// The layout the records were written with.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Statistics gathered during the build.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Opens the records for lookup and enumeration.
    pub fn word_list(&self) -> Result<WordList<'_>, DecodeError> {
        WordList::new(&self.records, self.layout)
    }

    /// The records wrapped in a self-describing [container](super::container).
    ///
    /// Fails with [`BuilderError::CountOverflow`] if the slot or word count
    /// exceeds the header's 32-bit fields.
    pub fn to_container(&self) -> Result<Vec<u8>, BuilderError> {
        container::wrap(&self.records, self.layout, self.stats.words)
    }
}

/// Builds a word list from an iterator of words with the default configuration.
///
/// Each word must implement [`IntoWord`], so `&str`, `String`, byte slices,
/// vectors and arrays are all accepted. Order does not matter.
///
/// # Examples
///
/// ```
/// use packed_dawg::dawg::builder::build_wordlist;
///
/// let packed = build_wordlist(["team", "teams", "test"]).unwrap();
/// let list = packed.word_list().unwrap();
/// assert!(list.contains("teams"));
/// assert!(!list.contains("tea"));
/// ```
///
/// Building from bytes:
///
/// ```
/// use packed_dawg::dawg::builder::build_wordlist;
///
/// let words: Vec<Vec<u8>> = vec![vec![1, 2, 3], vec![1, 2, 4], vec![2, 3, 4]];
/// let packed = build_wordlist(words).unwrap();
/// let list = packed.word_list().unwrap();
/// assert!(list.contains([1, 2, 3]));
/// assert!(!list.contains([1, 2, 5]));
/// ```
pub fn build_wordlist<W: IntoWord>(words: impl IntoIterator<Item = W>) -> Result<Packed, BuilderError> {
    build_wordlist_with(BuildConfig::default(), words)
}

/// Builds a word list from an iterator of words with `config`.
pub fn build_wordlist_with<W: IntoWord>(
    config: BuildConfig,
    words: impl IntoIterator<Item = W>,
) -> Result<Packed, BuilderError> {
    let mut builder = Builder::with_config(config)?;
    for word in words {
        builder.add_word(word)?;
    }
    builder.build()
}
