//! # packed-dawg
//!
//! A compact, read-only word list stored as a packed
//! [DAWG](https://en.wikipedia.org/wiki/Deterministic_acyclic_finite_state_automaton)
//! (Directed Acyclic Word Graph), built for hosts where the static footprint matters.
//!
//! Words are inserted into a radix trie, labels are cut into fixed-width segments,
//! identical subtrees are merged into a DAG and the result is written as a flat array
//! of fixed-size records. At runtime the array is used as is: lookups and enumeration
//! walk it by index arithmetic without building anything.
//!
//! ## Features
//!
//! - **Compact**: shared subtrees are stored once, labels hold several bytes per record
//! - **No decoding step**: [`WordList`](dawg::WordList) borrows the raw bytes
//! - **Checked once**: corrupt input is rejected up front instead of read out of bounds
//! - **Configurable layout**: label width, inline edges, index width and sentinel, see
//!   [`Layout`](dawg::Layout)
//! - **Thread-safe**: a `WordList` is `Copy + Send + Sync`
//!
//! ## Quick Start
//!
//! ```
//! use packed_dawg::dawg::build_wordlist;
//!
//! let packed = build_wordlist(["BAKE", "CAKE", "FAKE", "LAKE", "MAKE"]).unwrap();
//! let list = packed.word_list().unwrap();
//!
//! assert!(list.contains("CAKE"));
//! assert!(!list.contains("AKE"));
//! assert_eq!(list.words().count(), 5);
//! ```
//!
//! The packed bytes can be stored and opened again later. The raw record array
//! has no header, so the layout has to be supplied; [`to_container`](dawg::Packed::to_container)
//! adds a header carrying it along with a checksum:
//!
//! ```
//! use packed_dawg::dawg::{build_wordlist, Layout, WordList};
//!
//! let packed = build_wordlist(["BAKE", "BAKED", "BAKER"]).unwrap();
//!
//! let raw = packed.as_bytes().to_vec();
//! let list = WordList::new(&raw, Layout::default()).unwrap();
//! assert!(list.contains("BAKER"));
//!
//! let file = packed.to_container().unwrap();
//! let list = WordList::from_container(&file).unwrap();
//! assert!(list.contains("BAKED"));
//! ```
//!
//! ## Configuration
//!
//! ```
//! use packed_dawg::dawg::{build_wordlist_with, BuildConfig, IndexWidth, Layout, MergePolicy};
//!
//! let config = BuildConfig {
//!     layout: Layout {
//!         label_width: 6,
//!         index_width: IndexWidth::U32,
//!         ..Layout::default()
//!     },
//!     merge: MergePolicy::Verified,
//!     ..BuildConfig::default()
//! };
//! let packed = build_wordlist_with(config, ["ALFA", "BRAVO", "CHARLIE"]).unwrap();
//! assert_eq!(packed.layout().record_size(), 6 + 1 + 2 * 4);
//! ```

#![warn(missing_docs)]

/// Packed word graph: build pipeline, record layout and runtime lookup.
pub mod dawg;

#[cfg(test)]
mod test {
    use itertools::{iproduct, Itertools};

    use crate::dawg::{
        build_wordlist, build_wordlist_with, BuildConfig, IndexWidth, Layout, MergePolicy, Packed,
    };

    fn enumerate(packed: &Packed) -> Vec<String> {
        packed
            .word_list()
            .unwrap()
            .words()
            .map(|w| String::from_utf8(w).unwrap())
            .collect()
    }

    fn without_merging() -> BuildConfig {
        BuildConfig {
            max_rounds: 0,
            ..BuildConfig::default()
        }
    }

    /// A few hundred words with lots of shared prefixes and suffixes.
    fn generated_words() -> Vec<String> {
        let heads = ["b", "c", "st", "str", "sh", "pr"];
        let bodies = ["a", "ai", "ea", "o", "oo", "u"];
        let tails = ["", "k", "ke", "kes", "ked", "king", "n", "ns", "rd", "rds"];
        iproduct!(heads, bodies, tails)
            .map(|(h, b, t)| format!("{h}{b}{t}"))
            .collect()
    }

    #[test]
    fn team_scenario() {
        let packed = build_wordlist(["team", "teams", "test"]).unwrap();
        let list = packed.word_list().unwrap();
        assert!(!list.contains("tea"));
        assert!(list.contains("team"));
        assert!(list.contains("teams"));
        assert!(list.contains("test"));
        assert_eq!(enumerate(&packed), ["team", "teams", "test"]);
    }

    #[test]
    fn prefix_is_not_a_word() {
        let packed = build_wordlist(["teams"]).unwrap();
        let list = packed.word_list().unwrap();
        assert!(!list.contains("team"));
        assert!(list.contains("teams"));
    }

    #[test]
    fn lookup_and_enumeration_are_exact() {
        let words = generated_words();
        let packed = build_wordlist(&words).unwrap();
        let list = packed.word_list().unwrap();
        for word in &words {
            assert!(list.contains(word), "{word}");
            assert!(!list.contains(format!("{word}x")), "{word}x");
        }
        for absent in ["", "s", "sh", "shoo", "zzz", "brai"] {
            assert_eq!(list.contains(absent), words.iter().any(|w| w == absent), "{absent}");
        }
        let expected: Vec<String> = words.iter().cloned().sorted().dedup().collect();
        assert_eq!(enumerate(&packed), expected);
        assert_eq!(packed.stats().words, expected.len());
    }

    #[test]
    fn insertion_order_does_not_matter() {
        const WORDS: [&str; 6] = ["bake", "baked", "baker", "cake", "caked", "lake"];
        let reference = build_wordlist(WORDS).unwrap();
        for order in WORDS.iter().permutations(WORDS.len()) {
            let packed = build_wordlist(order).unwrap();
            assert_eq!(packed.as_bytes(), reference.as_bytes());
        }
    }

    #[test]
    fn merging_preserves_the_word_set() {
        let words = generated_words();
        let plain = build_wordlist_with(without_merging(), &words).unwrap();
        let merged = build_wordlist(&words).unwrap();
        assert!(merged.stats().dag_nodes < plain.stats().dag_nodes);
        assert_eq!(enumerate(&plain), enumerate(&merged));
        let (plain, merged) = (plain.word_list().unwrap(), merged.word_list().unwrap());
        for query in words.iter().map(String::as_str).chain(["st", "stai", "prooks", "b"]) {
            assert_eq!(plain.contains(query), merged.contains(query), "{query}");
        }
    }

    #[test]
    fn packing_is_deterministic() {
        let words = generated_words();
        assert_eq!(build_wordlist(&words).unwrap(), build_wordlist(&words).unwrap());
    }

    #[test]
    fn twenty_children_round_trip_through_overflow() {
        let words: Vec<String> = (b'a'..=b't')
            .flat_map(|c| [format!("x{}", c as char), format!("y{}q", c as char)])
            .collect();
        for merge_rounds in [0, 100] {
            let config = BuildConfig {
                max_rounds: merge_rounds,
                ..BuildConfig::default()
            };
            let packed = build_wordlist_with(config, &words).unwrap();
            assert!(packed.stats().overflow_slots >= 8);
            assert_eq!(packed.stats().edge_histogram[20], 2);
            let list = packed.word_list().unwrap();
            for word in &words {
                assert!(list.contains(word), "{word}");
            }
            assert!(!list.contains("xu"));
            assert!(!list.contains("yaa"));
            assert_eq!(enumerate(&packed), words.iter().cloned().sorted().collect::<Vec<_>>());
        }
    }

    #[test]
    fn alternative_layouts() {
        let words = generated_words();
        let layouts = [
            Layout {
                index_width: IndexWidth::U32,
                ..Layout::default()
            },
            Layout {
                inline_edges: 0,
                ..Layout::default()
            },
            Layout {
                label_width: 1,
                inline_edges: 5,
                ..Layout::default()
            },
            Layout {
                label_width: 12,
                inline_edges: 1,
                index_width: IndexWidth::U32,
                sentinel: b'\n',
            },
        ];
        let expected = enumerate(&build_wordlist(&words).unwrap());
        for layout in layouts {
            let config = BuildConfig {
                layout,
                ..BuildConfig::default()
            };
            let packed = build_wordlist_with(config, &words).unwrap();
            assert_eq!(packed.as_bytes().len() % layout.record_size(), 0);
            let list = packed.word_list().unwrap();
            assert!(words.iter().all(|w| list.contains(w)), "{layout:?}");
            assert_eq!(enumerate(&packed), expected, "{layout:?}");
        }
    }

    /// "Ab*" and "BA*" share a fingerprint. Fast merging unifies them, which
    /// loses "zzzzBA"; this records that behavior rather than endorsing it.
    #[test]
    fn fingerprint_collision_behavior() {
        let words = ["wwwwAb", "zzzzBA"];

        let verified = build_wordlist(words).unwrap();
        let list = verified.word_list().unwrap();
        assert!(list.contains("zzzzBA"));
        assert!(!list.contains("zzzzAb"));

        let config = BuildConfig {
            merge: MergePolicy::Fast,
            ..BuildConfig::default()
        };
        let fast = build_wordlist_with(config, words).unwrap();
        let list = fast.word_list().unwrap();
        assert!(list.contains("wwwwAb"));
        assert!(list.contains("zzzzAb"));
        assert!(!list.contains("zzzzBA"));
        assert!(fast.stats().dag_nodes < verified.stats().dag_nodes);
    }

    #[test]
    fn lookups_from_many_threads() {
        let words = generated_words();
        let packed = build_wordlist(&words).unwrap();
        let list = packed.word_list().unwrap();
        let total = words.len();
        std::thread::scope(|scope| {
            for chunk in words.chunks(64) {
                scope.spawn(move || {
                    for word in chunk {
                        assert!(list.contains(word));
                    }
                    assert_eq!(list.words().count(), total);
                });
            }
        });
    }
}
