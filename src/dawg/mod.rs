/// Build pipeline: configuration, the word list builder and its output.
pub mod builder;
/// Self-describing header around a record array.
pub mod container;
/// Subtree fingerprints and merging of identical subtrees.
pub mod dedup;
/// Error types for building and decoding.
pub mod error;
/// Rules shared by build time and lookup for labels and terminated words.
pub mod label;
/// Record layout of the packed format.
pub mod layout;
mod normalize;
/// Packing a trie into records.
pub mod pack;
/// Lookup and enumeration over packed records.
pub mod reader;
/// The mutable build-time prefix tree.
pub mod trie;

pub use builder::{build_wordlist, build_wordlist_with, BuildConfig, BuildStats, Builder, IntoWord, Packed};
pub use dedup::MergePolicy;
pub use error::{BuilderError, DecodeError, LayoutError};
pub use layout::{IndexWidth, Layout};
pub use reader::{WordList, Words};
pub use trie::Trie;
