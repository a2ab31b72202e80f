use std::iter::FusedIterator;

use log::debug;

use super::error::DecodeError;
use super::label;
use super::layout::Layout;

/// A read-only view of a packed word graph.
///
/// The record array is used as is: lookups and enumeration walk it by index
/// arithmetic and never copy or rebuild it. The blob is checked once by
/// [`WordList::new`]; afterwards every operation is infallible, side-effect free
/// and safe to run from any number of threads at once.
///
/// # Examples
///
/// ```
/// use packed_dawg::dawg::builder::build_wordlist;
///
/// let packed = build_wordlist(["team", "teams", "test"]).unwrap();
/// let list = packed.word_list().unwrap();
/// assert!(list.contains("team"));
/// assert!(!list.contains("tea"));
///
/// let words: Vec<Vec<u8>> = list.words().collect();
/// assert_eq!(words, [&b"team"[..], b"teams", b"test"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WordList<'a> {
    data: &'a [u8],
    layout: Layout,
    max_depth: usize,
}

/// One decoded record.
#[derive(Debug, Clone, Copy)]
struct Record<'a> {
    bytes: &'a [u8],
    layout: Layout,
}

impl<'a> Record<'a> {
    #[inline]
    fn label(&self) -> &'a [u8] {
        label::stored_label(&self.bytes[..self.layout.label_width])
    }

    #[inline]
    fn edge_count(&self) -> usize {
        usize::from(self.bytes[self.layout.label_width])
    }

    /// Slot of edge `i`. Edges past the inline capacity are read from the
    /// record's overflow slots, which directly follow it.
    #[inline]
    fn edge(&self, i: usize) -> usize {
        let at = self.layout.edge_offset(i);
        self.layout.index_width.read(&self.bytes[at..])
    }

    #[inline]
    fn edges(self) -> impl DoubleEndedIterator<Item = usize> + 'a {
        (0..self.edge_count()).map(move |i| self.edge(i))
    }

    #[inline]
    fn is_terminal(&self) -> bool {
        label::is_terminal(self.label(), self.layout.sentinel)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Open,
    Done(usize),
    Overflow,
}

impl<'a> WordList<'a> {
    /// Wraps a raw record array written with `layout`.
    ///
    /// Every record reachable from the root is checked: edges stay inside the
    /// blob and never point at overflow slots, overflow edges fit, words end
    /// in leaves, and no path loops. The deepest path is measured so the
    /// enumerator can size its stack up front.
    pub fn new(data: &'a [u8], layout: Layout) -> Result<Self, DecodeError> {
        layout.validate()?;
        let record_size = layout.record_size();
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }
        if data.len() % record_size != 0 {
            return Err(DecodeError::Misaligned {
                len: data.len(),
                record_size,
            });
        }
        let mut list = WordList {
            data,
            layout,
            max_depth: 0,
        };
        list.max_depth = list.check_graph()?;
        debug!(
            "opened word list: {} slots, deepest path {} records",
            list.slot_count(),
            list.max_depth
        );
        Ok(list)
    }

    /// Number of record slots, overflow slots included.
    pub fn slot_count(&self) -> usize {
        self.data.len() / self.layout.record_size()
    }

    /// Records on the longest path from the root to a leaf, the root included.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The layout the records were written with.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The raw record bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    fn record(&self, slot: usize) -> Record<'a> {
        let start = slot * self.layout.record_size();
        Record {
            bytes: &self.data[start..],
            layout: self.layout,
        }
    }

    /// Returns true if `word` is stored.
    ///
    /// Starting at the root, the label of the current record is stripped from
    /// the word and the first edge whose label prefixes the rest (with the
    /// sentinel appended) is followed. The word is found once all of it,
    /// sentinel included, has been consumed. A stored word's proper prefixes
    /// are not found unless they were stored themselves.
    pub fn contains(&self, word: impl AsRef<[u8]>) -> bool {
        let word = word.as_ref();
        let sentinel = self.layout.sentinel;
        let mut record = self.record(0);
        if !label::matches_at(record.label(), word, 0, sentinel) {
            return false;
        }
        let mut pos = 0;
        loop {
            pos += record.label().len();
            if pos > word.len() {
                return true;
            }
            let next = record
                .edges()
                .map(|slot| self.record(slot))
                .find(|child| label::matches_at(child.label(), word, pos, sentinel));
            match next {
                Some(child) => record = child,
                None => return false,
            }
        }
    }

    /// Returns an enumerator over every stored word in lexicographic order.
    pub fn words(&self) -> Words<'a> {
        let mut stack = Vec::with_capacity(self.max_depth + 2 * self.layout.inline_edges);
        stack.push((0, 0));
        Words {
            list: *self,
            stack,
            word: Vec::new(),
        }
    }

    /// Walks every reachable record once, depth first, and returns the depth of
    /// the deepest path.
    fn check_graph(&self) -> Result<usize, DecodeError> {
        let slots = self.slot_count();
        let mut marks = vec![Mark::New; slots];
        self.open(0, &mut marks)?;
        let mut stack = vec![(0usize, 0usize)];
        while let Some(top) = stack.last_mut() {
            let (slot, i) = *top;
            let record = self.record(slot);
            if i == record.edge_count() {
                let depth = 1 + record
                    .edges()
                    .map(|child| match marks[child] {
                        Mark::Done(depth) => depth,
                        _ => 0,
                    })
                    .max()
                    .unwrap_or(0);
                marks[slot] = Mark::Done(depth);
                stack.pop();
                continue;
            }
            top.1 += 1;
            let target = record.edge(i);
            if target >= slots {
                return Err(DecodeError::EdgeOutOfBounds { slot, target, slots });
            }
            match marks[target] {
                Mark::New => {
                    self.open(target, &mut marks)?;
                    stack.push((target, 0));
                }
                Mark::Open => return Err(DecodeError::Cycle { slot: target }),
                Mark::Overflow => return Err(DecodeError::OverflowReferenced { slot, target }),
                Mark::Done(_) => {}
            }
        }
        match marks[0] {
            Mark::Done(depth) => Ok(depth),
            _ => Ok(1),
        }
    }

    /// Checks a record on first visit and reserves its overflow slots.
    fn open(&self, slot: usize, marks: &mut [Mark]) -> Result<(), DecodeError> {
        let record = self.record(slot);
        let edges = record.edge_count();
        let needed = self.layout.slots_for(edges);
        if slot + needed > marks.len() {
            return Err(DecodeError::TruncatedRecord {
                slot,
                needed,
                slots: marks.len(),
            });
        }
        if record.is_terminal() && edges > 0 {
            return Err(DecodeError::TerminatorWithEdges { slot, edges });
        }
        if !record.is_terminal() && edges == 0 && slot != 0 {
            return Err(DecodeError::UnterminatedLeaf { slot });
        }
        marks[slot] = Mark::Open;
        for extra in slot + 1..slot + needed {
            if marks[extra] != Mark::New {
                return Err(DecodeError::OverflowReferenced { slot, target: extra });
            }
            marks[extra] = Mark::Overflow;
        }
        Ok(())
    }
}

/// Enumerator over the words of a [`WordList`], created by [`WordList::words`].
///
/// Words come out in lexicographic order as owned buffers. The sequence is
/// finite and cannot be restarted; ask the list for a new enumerator instead.
#[derive(Debug, Clone)]
pub struct Words<'a> {
    list: WordList<'a>,
    stack: Vec<(usize, usize)>,
    word: Vec<u8>,
}

impl Iterator for Words<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        while let Some((slot, len)) = self.stack.pop() {
            let record = self.list.record(slot);
            self.word.truncate(len);
            self.word.extend_from_slice(record.label());
            if record.edge_count() == 0 {
                // Only the root of an empty list is a leaf without a sentinel.
                if record.is_terminal() {
                    return Some(self.word[..self.word.len() - 1].to_vec());
                }
                continue;
            }
            let len = self.word.len();
            // Reverse order, so the smallest label is popped first.
            self.stack.extend(record.edges().rev().map(|child| (child, len)));
        }
        None
    }
}

impl FusedIterator for Words<'_> {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dawg::layout::IndexWidth;

    /// Records for {"team", "teams", "test"} in the default layout.
    #[rustfmt::skip]
    const TEAM: [u8; 54] = [
        0, 0, 0, 0,           1, 1, 0, 0, 0,
        b't', b'e', 0, 0,     2, 2, 0, 3, 0,
        b'a', b'm', 0, 0,     2, 4, 0, 5, 0,
        b's', b't', b'*', 0,  0, 0, 0, 0, 0,
        b'*', 0, 0, 0,        0, 0, 0, 0, 0,
        b's', b'*', 0, 0,     0, 0, 0, 0, 0,
    ];

    fn strings(list: &WordList) -> Vec<String> {
        list.words()
            .map(|w| String::from_utf8(w).unwrap())
            .collect()
    }

    #[test]
    fn lookup_on_handmade_records() {
        let list = WordList::new(&TEAM, Layout::default()).unwrap();
        assert!(list.contains("team"));
        assert!(list.contains("teams"));
        assert!(list.contains("test"));
        assert!(!list.contains("tea"));
        assert!(!list.contains("te"));
        assert!(!list.contains(""));
        assert!(!list.contains("tests"));
        assert!(!list.contains("team*"));
        assert!(!list.contains(b"te\0"));
        assert_eq!(list.slot_count(), 6);
        assert_eq!(list.max_depth(), 4);
    }

    #[test]
    fn enumerate_handmade_records() {
        let list = WordList::new(&TEAM, Layout::default()).unwrap();
        assert_eq!(strings(&list), ["team", "teams", "test"]);
    }

    #[test]
    fn enumerator_is_finite() {
        let list = WordList::new(&TEAM, Layout::default()).unwrap();
        let mut words = list.words();
        assert_eq!(words.by_ref().count(), 3);
        assert_eq!(words.next(), None);
        assert_eq!(words.next(), None);
        assert_eq!(list.words().count(), 3);
    }

    #[test]
    fn bare_root_is_an_empty_list() {
        let data = [0u8; 9];
        let list = WordList::new(&data, Layout::default()).unwrap();
        assert_eq!(list.words().next(), None);
        assert!(!list.contains(""));
        assert!(!list.contains("a"));
    }

    #[test]
    fn shape_errors() {
        assert_eq!(WordList::new(&[], Layout::default()).unwrap_err(), DecodeError::Empty);
        assert_eq!(
            WordList::new(&TEAM[..50], Layout::default()).unwrap_err(),
            DecodeError::Misaligned {
                len: 50,
                record_size: 9
            }
        );
        let bad = Layout {
            label_width: 0,
            ..Layout::default()
        };
        assert!(matches!(WordList::new(&TEAM, bad), Err(DecodeError::Layout(_))));
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        assert_eq!(
            WordList::new(&TEAM[..45], Layout::default()).unwrap_err(),
            DecodeError::EdgeOutOfBounds {
                slot: 2,
                target: 5,
                slots: 5
            }
        );
    }

    #[test]
    fn cycles_are_corrupt() {
        let mut data = TEAM;
        // "am" -> "te"
        data[2 * 9 + 5] = 1;
        assert_eq!(
            WordList::new(&data, Layout::default()).unwrap_err(),
            DecodeError::Cycle { slot: 1 }
        );
    }

    #[test]
    fn terminators_must_be_leaves() {
        let mut data = TEAM;
        data[4 * 9 + 4] = 1;
        data[4 * 9 + 5] = 5;
        assert_eq!(
            WordList::new(&data, Layout::default()).unwrap_err(),
            DecodeError::TerminatorWithEdges { slot: 4, edges: 1 }
        );
    }

    #[test]
    fn inner_leaves_must_end_words() {
        let mut data = TEAM;
        data[5 * 9 + 1] = b'x';
        assert_eq!(
            WordList::new(&data, Layout::default()).unwrap_err(),
            DecodeError::UnterminatedLeaf { slot: 5 }
        );
    }

    #[test]
    fn overflow_slots_are_not_nodes() {
        // Root with three edges reserves slot 1 for its third edge, which then
        // points back into that same reserved slot.
        #[rustfmt::skip]
        let data: [u8; 36] = [
            0, 0, 0, 0,       3, 2, 0, 3, 0,
            1, 0, 0, 0,       0, 0, 0, 0, 0,
            b'a', b'*', 0, 0, 0, 0, 0, 0, 0,
            b'b', b'*', 0, 0, 0, 0, 0, 0, 0,
        ];
        assert_eq!(
            WordList::new(&data, Layout::default()).unwrap_err(),
            DecodeError::OverflowReferenced { slot: 0, target: 1 }
        );
    }

    #[test]
    fn overflow_running_past_the_end_is_corrupt() {
        let mut data = [0u8; 9];
        data[4] = 3;
        assert_eq!(
            WordList::new(&data, Layout::default()).unwrap_err(),
            DecodeError::TruncatedRecord {
                slot: 0,
                needed: 2,
                slots: 1
            }
        );
    }

    #[test]
    fn one_byte_indices() {
        let layout = Layout {
            index_width: IndexWidth::U8,
            ..Layout::default()
        };
        #[rustfmt::skip]
        let data: [u8; 21] = [
            0, 0, 0, 0,       2, 1, 2,
            b'a', b'*', 0, 0, 0, 0, 0,
            b'b', b'*', 0, 0, 0, 0, 0,
        ];
        let list = WordList::new(&data, layout).unwrap();
        assert_eq!(strings(&list), ["a", "b"]);
        assert!(list.contains("b"));
    }

    #[test]
    fn word_list_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WordList<'static>>();
        fn assert_send<T: Send>() {}
        assert_send::<Words<'static>>();
    }
}
