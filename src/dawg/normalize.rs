//! Passes run once every word is inserted and before hashing.

use hashbrown::HashMap;
use mark_last::MarkLastIterator;

use super::label;
use super::trie::{NodeId, Trie};

impl Trie {
    /// Orders every node's children by label.
    ///
    /// Hashing depends on child order, and the enumerator relies on it to
    /// produce words in lexicographic order.
    pub fn sort_children(&mut self) {
        let sentinel = self.sentinel();
        for id in self.reachable() {
            let mut children = std::mem::take(&mut self.node_mut(id).children);
            children.sort_by(|&a, &b| label::compare(self.label_of(a), self.label_of(b), sentinel));
            self.node_mut(id).children = children;
        }
    }

    /// Replaces every label longer than `width` with a chain of nodes holding at
    /// most `width` bytes each. Returns the number of nodes added.
    ///
    /// Shared nodes are split once and all their parents are pointed at the
    /// new head, so the pass also works on a merged graph. `width` must be at
    /// least 1.
    pub fn split_long_labels(&mut self, width: usize) -> usize {
        debug_assert!(width > 0);
        let mut added = 0;
        let mut heads: HashMap<NodeId, NodeId> = HashMap::new();
        let mut seen = vec![false; self.node_count()];
        seen[NodeId::ROOT.index()] = true;
        let mut stack = vec![NodeId::ROOT];
        while let Some(parent) = stack.pop() {
            for slot in 0..self.node(parent).child_count() {
                let child = self.node(parent).children[slot];
                if let Some(&head) = heads.get(&child) {
                    self.node_mut(parent).children[slot] = head;
                    continue;
                }
                if self.label_of(child).len() > width {
                    let label = std::mem::take(&mut self.node_mut(child).label);
                    let mut head = child;
                    let mut tail: Option<NodeId> = None;
                    // The last segment stays with the original node so its children are kept.
                    for (last, segment) in label.chunks(width).mark_last() {
                        let id = if last {
                            self.node_mut(child).label.extend_from_slice(segment);
                            child
                        } else {
                            added += 1;
                            self.alloc(segment)
                        };
                        match tail {
                            Some(prev) => self.node_mut(prev).children.push(id),
                            None => head = id,
                        }
                        tail = Some(id);
                    }
                    heads.insert(child, head);
                    self.node_mut(parent).children[slot] = head;
                }
                if !std::mem::replace(&mut seen[child.index()], true) {
                    stack.push(child);
                }
            }
        }
        added
    }
}
