//! Serializes a normalized (and usually deduplicated) trie into fixed-size records.

use log::debug;

use super::error::BuilderError;
use super::layout::Layout;
use super::trie::{NodeId, Trie};

const UNPLACED: usize = usize::MAX;

/// The packed record array and a few numbers describing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutput {
    /// `slots * layout.record_size()` bytes; record 0 is the root.
    pub records: Vec<u8>,
    /// Total slots, overflow slots included.
    pub slots: usize,
    /// Slots holding overflow edges rather than node headers.
    pub overflow_slots: usize,
    /// Distinct nodes written.
    pub nodes: usize,
}

impl Trie {
    /// Packs every node reachable from the root into a record array.
    ///
    /// Each distinct node is given a slot the first time it is reached, along
    /// with the overflow slots its edge count requires; shared nodes are written
    /// once and referenced from all their parents. Slots are handed out for all
    /// children of a node before descending into the first of them.
    ///
    /// Fails without producing output if any slot index exceeds the index width,
    /// if a node has more than 255 edges, or if a label is wider than the label
    /// field (the trie was not [split](Trie::split_long_labels)).
    pub fn pack(&self, layout: &Layout) -> Result<PackOutput, BuilderError> {
        layout.validate()?;
        let mut placer = Placer {
            trie: self,
            layout,
            slot_of: vec![UNPLACED; self.node_count()],
            order: Vec::new(),
            next: 0,
            overflow_slots: 0,
        };
        placer.place_all()?;
        debug!(
            "packed {} nodes into {} slots ({} overflow)",
            placer.order.len(),
            placer.next,
            placer.overflow_slots
        );

        let record_size = layout.record_size();
        let mut records = vec![0u8; placer.next * record_size];
        for &id in &placer.order {
            let node = self.node(id);
            let start = placer.slot_of[id.index()] * record_size;
            let label = node.label();
            records[start..start + label.len()].copy_from_slice(label);
            records[start + layout.label_width] = node.child_count() as u8;
            for (i, &child) in node.children().iter().enumerate() {
                let at = start + layout.edge_offset(i);
                layout
                    .index_width
                    .write(placer.slot_of[child.index()], &mut records[at..]);
            }
        }

        Ok(PackOutput {
            records,
            slots: placer.next,
            overflow_slots: placer.overflow_slots,
            nodes: placer.order.len(),
        })
    }
}

struct Placer<'a> {
    trie: &'a Trie,
    layout: &'a Layout,
    slot_of: Vec<usize>,
    order: Vec<NodeId>,
    next: usize,
    overflow_slots: usize,
}

impl Placer<'_> {
    fn place_all(&mut self) -> Result<(), BuilderError> {
        let mut expanded = vec![false; self.trie.node_count()];
        self.place(NodeId::ROOT)?;
        self.place_children(NodeId::ROOT)?;
        expanded[NodeId::ROOT.index()] = true;

        let mut stack = vec![(NodeId::ROOT, 0)];
        while let Some(top) = stack.last_mut() {
            let (id, i) = *top;
            let Some(&child) = self.trie.node(id).children().get(i) else {
                stack.pop();
                continue;
            };
            top.1 += 1;
            if !std::mem::replace(&mut expanded[child.index()], true) {
                self.place_children(child)?;
                stack.push((child, 0));
            }
        }
        Ok(())
    }

    fn place_children(&mut self, id: NodeId) -> Result<(), BuilderError> {
        for &child in self.trie.node(id).children() {
            if self.slot_of[child.index()] == UNPLACED {
                self.place(child)?;
            }
        }
        Ok(())
    }

    fn place(&mut self, id: NodeId) -> Result<(), BuilderError> {
        let node = self.trie.node(id);
        if node.label().len() > self.layout.label_width {
            return Err(BuilderError::LabelTooWide {
                len: node.label().len(),
                width: self.layout.label_width,
            });
        }
        if node.child_count() > usize::from(u8::MAX) {
            return Err(BuilderError::TooManyEdges {
                count: node.child_count(),
            });
        }
        let width = self.layout.index_width;
        if self.next > width.max_index() {
            return Err(BuilderError::IndexOverflow {
                index: self.next,
                width: width.bytes(),
            });
        }
        self.slot_of[id.index()] = self.next;
        self.order.push(id);
        let overflow = self.layout.overflow_slots(node.child_count());
        self.overflow_slots += overflow;
        self.next += 1 + overflow;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dawg::dedup::{MergePolicy, DEFAULT_MAX_ROUNDS};
    use crate::dawg::layout::IndexWidth;

    fn normalized(words: &[&str]) -> Trie {
        let mut trie = Trie::new(b'*');
        for word in words {
            trie.insert(word.as_bytes());
        }
        trie.split_long_labels(4);
        trie.sort_children();
        trie
    }

    #[test]
    fn exact_bytes_for_small_list() {
        let trie = normalized(&["team", "teams", "test"]);
        let out = trie.pack(&Layout::default()).unwrap();
        #[rustfmt::skip]
        let expected: [u8; 54] = [
            0, 0, 0, 0,           1, 1, 0, 0, 0,
            b't', b'e', 0, 0,     2, 2, 0, 3, 0,
            b'a', b'm', 0, 0,     2, 4, 0, 5, 0,
            b's', b't', b'*', 0,  0, 0, 0, 0, 0,
            b'*', 0, 0, 0,        0, 0, 0, 0, 0,
            b's', b'*', 0, 0,     0, 0, 0, 0, 0,
        ];
        assert_eq!(out.records, expected);
        assert_eq!(out.slots, 6);
        assert_eq!(out.nodes, 6);
        assert_eq!(out.overflow_slots, 0);
    }

    #[test]
    fn full_labels_are_not_terminated() {
        let trie = normalized(&["aardvark"]);
        let out = trie.pack(&Layout::default()).unwrap();
        assert_eq!(&out.records[9..13], b"aard");
        assert_eq!(out.records[13], 1);
        assert_eq!(&out.records[18..22], b"vark");
    }

    #[test]
    fn packing_is_repeatable() {
        let mut trie = normalized(&["bing", "binger", "bings", "ring", "ringer", "rings", "zoo"]);
        trie.deduplicate(MergePolicy::Verified, DEFAULT_MAX_ROUNDS);
        let layout = Layout::default();
        assert_eq!(trie.pack(&layout).unwrap(), trie.pack(&layout).unwrap());
    }

    #[test]
    fn shared_nodes_are_written_once() {
        let mut trie = normalized(&["ab", "ac", "cb", "cc"]);
        let tree = trie.pack(&Layout::default()).unwrap();
        trie.deduplicate(MergePolicy::Verified, DEFAULT_MAX_ROUNDS);
        let dag = trie.pack(&Layout::default()).unwrap();
        assert_eq!(tree.nodes, 7);
        assert_eq!(dag.nodes, 5);
        // Both inner nodes point at the same two leaves.
        assert_eq!(dag.records[14..18], dag.records[23..27]);
    }

    #[test]
    fn wide_node_spills_into_overflow_slots() {
        let words: Vec<String> = (b'a'..=b't').map(|c| (c as char).to_string()).collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        let trie = normalized(&words);
        let layout = Layout::default();
        let out = trie.pack(&layout).unwrap();
        assert_eq!(out.overflow_slots, 4);
        assert_eq!(out.slots, 25);
        assert_eq!(out.records[4], 20);
        for i in 0..20 {
            let at = layout.edge_offset(i);
            assert_eq!(layout.index_width.read(&out.records[at..]), 5 + i);
        }
        assert_eq!(&out.records[5 * 9..5 * 9 + 2], b"a*");
        assert_eq!(&out.records[24 * 9..24 * 9 + 2], b"t*");
    }

    #[test]
    fn index_overflow_fails_loudly() {
        let mut words = Vec::new();
        for a in b'a'..=b'z' {
            for b in b'a'..=b'z' {
                words.push(String::from_utf8(vec![a, b]).unwrap());
            }
        }
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        let trie = normalized(&words);
        let layout = Layout {
            index_width: IndexWidth::U8,
            ..Layout::default()
        };
        match trie.pack(&layout) {
            Err(BuilderError::IndexOverflow { index, width: 1 }) => assert_eq!(index, 256),
            other => panic!("expected an index overflow, got {other:?}"),
        }
        assert!(trie.pack(&Layout::default()).is_ok());
    }

    #[test]
    fn unsplit_labels_are_rejected() {
        let mut trie = Trie::new(b'*');
        trie.insert(b"aardvark");
        assert_eq!(
            trie.pack(&Layout::default()),
            Err(BuilderError::LabelTooWide { len: 9, width: 4 })
        );
    }

    #[test]
    fn too_many_edges_are_rejected() {
        let mut trie = Trie::new(b'*');
        for _ in 0..256 {
            let leaf = trie.alloc(b"x*");
            trie.node_mut(NodeId::ROOT).children.push(leaf);
        }
        assert_eq!(
            trie.pack(&Layout::default()),
            Err(BuilderError::TooManyEdges { count: 256 })
        );
    }

    #[test]
    fn empty_trie_is_a_bare_root() {
        let out = Trie::new(b'*').pack(&Layout::default()).unwrap();
        assert_eq!(out.records, [0u8; 9]);
    }
}
