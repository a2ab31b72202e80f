use smallvec::SmallVec;

use super::label::{self, shared_prefix_len};

/// Index of a node in a [`Trie`]'s arena.
///
/// Edges are plain indices, so once identical subtrees are merged a node can
/// have several parents without any ownership bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The root of every trie.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Label bytes of a build-time node.
pub(crate) type Label = SmallVec<[u8; 8]>;

/// A build-time node: a label and its outgoing edges in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrieNode {
    pub(crate) label: Label,
    pub(crate) children: SmallVec<[NodeId; 2]>,
}

impl TrieNode {
    fn new(label: &[u8]) -> Self {
        TrieNode {
            label: Label::from_slice(label),
            children: SmallVec::new(),
        }
    }

    /// The label of the edge leading into this node.
    #[inline]
    pub fn label(&self) -> &[u8] {
        &self.label
    }

    /// Outgoing edges, in order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the number of children.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// A mutable radix trie of sentinel-terminated words.
///
/// Nodes live in an arena and are never freed individually; the whole trie is
/// dropped at once when the build is over. Words are inserted in any order.
#[derive(Clone, Debug)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    sentinel: u8,
    words: usize,
}

impl Trie {
    /// Creates an empty trie whose words are terminated with `sentinel`.
    pub fn new(sentinel: u8) -> Self {
        Trie {
            nodes: vec![TrieNode::default()],
            sentinel,
            words: 0,
        }
    }

    /// The sentinel appended to every word.
    pub fn sentinel(&self) -> u8 {
        self.sentinel
    }

    /// Number of distinct words inserted.
    pub fn word_count(&self) -> usize {
        self.words
    }

    /// Number of nodes ever allocated, including nodes that merging left unreachable.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the node with the given id.
    #[inline]
    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TrieNode {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn label_of(&self, id: NodeId) -> &[u8] {
        &self.nodes[id.index()].label
    }

    /// Allocates a new childless node. The arena length doubles as the id counter.
    pub(crate) fn alloc(&mut self, label: &[u8]) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TrieNode::new(label));
        id
    }

    /// Inserts an already terminated word (see [`label::terminate`]).
    ///
    /// Returns `false` if the word was already present.
    pub(crate) fn insert_terminated(&mut self, text: &[u8]) -> bool {
        // Descend through every child whose whole label prefixes the rest.
        let mut node = NodeId::ROOT;
        let mut rest = text;
        loop {
            if rest.is_empty() {
                return false;
            }
            let next = self
                .node(node)
                .children
                .iter()
                .copied()
                .find(|&child| rest.starts_with(self.label_of(child)));
            match next {
                Some(child) => {
                    rest = &rest[self.label_of(child).len()..];
                    node = child;
                }
                None => break,
            }
        }

        // Longest partially shared label wins, earliest child on ties.
        let mut best: Option<(usize, usize)> = None;
        for (slot, &child) in self.node(node).children.iter().enumerate() {
            let shared = shared_prefix_len(self.label_of(child), rest);
            if shared > 0 && best.is_none_or(|(len, _)| shared > len) {
                best = Some((slot, shared));
            }
        }

        match best {
            None => {
                if node != NodeId::ROOT && self.node(node).children.is_empty() {
                    // A leaf gaining a child keeps an explicit terminator so the
                    // word it used to end is still recognized.
                    let marker = self.alloc(&[self.sentinel]);
                    self.node_mut(node).children.push(marker);
                }
                let leaf = self.alloc(rest);
                self.node_mut(node).children.push(leaf);
            }
            Some((slot, shared)) => {
                let old = self.node(node).children[slot];
                let split = self.alloc(&rest[..shared]);
                self.node_mut(old).label.drain(..shared);
                let leaf = self.alloc(&rest[shared..]);
                self.node_mut(split).children.extend([old, leaf]);
                self.node_mut(node).children[slot] = split;
            }
        }
        self.words += 1;
        true
    }

    /// Inserts `word`, which must not contain the NUL byte or the sentinel.
    ///
    /// Returns `false` if the word was already present. Use
    /// [`Builder`](super::builder::Builder) to get those checks and a length limit.
    pub fn insert(&mut self, word: &[u8]) -> bool {
        debug_assert!(!word.iter().any(|&b| b == 0 || b == self.sentinel));
        let mut text = label::WordBuf::from_slice(word);
        text.push(self.sentinel);
        self.insert_terminated(&text)
    }

    /// Returns true if `word` is stored, following the same rules as the packed lookup.
    pub fn contains(&self, word: &[u8]) -> bool {
        let mut node = NodeId::ROOT;
        let mut pos = 0;
        loop {
            pos += self.label_of(node).len();
            if pos > word.len() {
                return true;
            }
            let next = self
                .node(node)
                .children
                .iter()
                .copied()
                .find(|&child| label::matches_at(self.label_of(child), word, pos, self.sentinel));
            match next {
                Some(child) => node = child,
                None => return false,
            }
        }
    }

    /// Returns every stored word in child order.
    ///
    /// Once the trie is [sorted](Trie::sort_children) this is lexicographic order.
    pub fn words(&self) -> Vec<Vec<u8>> {
        let mut words = Vec::with_capacity(self.words);
        let mut stack = vec![(NodeId::ROOT, 0)];
        let mut word = Vec::new();
        while let Some((id, len)) = stack.pop() {
            word.truncate(len);
            word.extend_from_slice(self.label_of(id));
            let node = self.node(id);
            if node.children.is_empty() {
                if label::is_terminal(&word, self.sentinel) {
                    words.push(word[..word.len() - 1].to_vec());
                }
                continue;
            }
            stack.extend(node.children.iter().rev().map(|&child| (child, word.len())));
        }
        words
    }

    /// Visits every node reachable from the root exactly once, parents before children.
    pub fn reachable(&self) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            order.push(id);
            stack.extend(self.node(id).children.iter().rev());
        }
        order
    }

    /// Number of distinct nodes reachable from the root.
    pub fn reachable_count(&self) -> usize {
        self.reachable().len()
    }
}
