//! Structural fingerprints and subtree merging.
//!
//! A [`Fingerprint`] summarizes a subtree by a djb-style hash over its labels
//! and children together with its size. Merging then repeatedly picks the most
//! repeated subtree shape and points every copy of it at one representative,
//! turning the trie into a DAG whose size is bounded by the number of distinct
//! shapes rather than the number of occurrences.
//!
//! Fingerprints can collide. With [`MergePolicy::Fast`] colliding subtrees are
//! merged anyway, which silently changes the stored word set; with
//! [`MergePolicy::Verified`] every candidate is compared node by node first.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use log::debug;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::trie::{NodeId, Trie};

const HASH_SEED: u32 = 5381;

/// Round cap used by the default build configuration.
pub const DEFAULT_MAX_ROUNDS: usize = 100;

/// Hash and size of a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fingerprint {
    /// Order-sensitive hash over the labels of the subtree.
    pub hash: u32,
    /// Number of nodes in the subtree, counting shared nodes once per path.
    pub size: u32,
}

/// How fingerprint matches are turned into merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MergePolicy {
    /// Merge only subtrees that are structurally identical.
    #[default]
    Verified,
    /// Trust fingerprint equality. Cheaper, but a collision merges different subtrees.
    Fast,
}

/// Summary of a [`Trie::deduplicate`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DedupReport {
    /// Rounds that merged at least one edge.
    pub rounds: usize,
    /// Edges redirected to a representative.
    pub merged_edges: usize,
}

#[inline]
fn mix(hash: u32, value: u32) -> u32 {
    (hash << 5).wrapping_add(hash).wrapping_add(value)
}

/// Hash of a label on its own, before children are folded in.
pub(crate) fn label_hash(label: &[u8]) -> u32 {
    label.iter().fold(HASH_SEED, |hash, &b| mix(hash, u32::from(b)))
}

/// One group of structurally identical nodes found during a counting pass.
struct Class {
    rep: NodeId,
    count: usize,
    first_seen: usize,
}

impl Trie {
    /// Computes the fingerprint of every reachable node, indexed by [`NodeId::index`].
    ///
    /// Unreachable arena slots keep the default fingerprint.
    pub fn fingerprints(&self) -> Vec<Fingerprint> {
        let mut prints: Vec<Option<Fingerprint>> = vec![None; self.node_count()];
        // Post-order over an explicit stack; tries can be as deep as their longest word.
        let mut stack = vec![(NodeId::ROOT, 0usize)];
        while let Some(top) = stack.last_mut() {
            let (id, i) = *top;
            if let Some(&child) = self.node(id).children().get(i) {
                top.1 += 1;
                if prints[child.index()].is_none() {
                    stack.push((child, 0));
                }
                continue;
            }
            stack.pop();
            let node = self.node(id);
            let mut hash = label_hash(node.label());
            let mut size = 1u32;
            for &child in node.children() {
                let print = prints[child.index()].unwrap_or_default();
                hash = mix(hash, print.hash);
                size = size.saturating_add(print.size);
            }
            prints[id.index()] = Some(Fingerprint { hash, size });
        }
        prints.into_iter().map(Option::unwrap_or_default).collect()
    }

    /// Returns true if the subtrees at `a` and `b` store the same labels in the same shape.
    pub fn same_structure(&self, a: NodeId, b: NodeId) -> bool {
        let mut pending = vec![(a, b)];
        while let Some((a, b)) = pending.pop() {
            if a == b {
                continue;
            }
            let (na, nb) = (self.node(a), self.node(b));
            if na.label() != nb.label() || na.child_count() != nb.child_count() {
                return false;
            }
            pending.extend(na.children().iter().copied().zip(nb.children().iter().copied()));
        }
        true
    }

    /// Merges repeated subtrees for at most `max_rounds` rounds.
    ///
    /// Each round counts the distinct subtree shapes reachable from the root,
    /// stops if none occurs more than once, and otherwise redirects every edge
    /// into a copy of the most frequent shape to a single representative.
    /// Edges only ever move to a node of the same fingerprint size, which is
    /// strictly smaller than the parent's, so no cycle can appear.
    pub fn deduplicate(&mut self, policy: MergePolicy, max_rounds: usize) -> DedupReport {
        let prints = self.fingerprints();
        let mut report = DedupReport::default();
        for round in 0..max_rounds {
            let Some((key, rep, count)) = self.most_repeated(&prints, policy) else {
                debug!("dedup round {round}: no repeated subtrees left");
                break;
            };
            let merged = self.redirect(&prints, key, rep, policy);
            debug!(
                "dedup round {round}: {count} copies of a {}-node subtree ({:#010x}), {merged} edges redirected",
                key.size, key.hash
            );
            report.rounds += 1;
            report.merged_edges += merged;
        }
        report
    }

    /// Counts shapes over the distinct reachable nodes and returns the most
    /// repeated one, or `None` if every shape is unique.
    fn most_repeated(
        &self,
        prints: &[Fingerprint],
        policy: MergePolicy,
    ) -> Option<(Fingerprint, NodeId, usize)> {
        let mut table: HashMap<Fingerprint, SmallVec<[Class; 1]>> = HashMap::new();
        for (order, id) in self.reachable().into_iter().enumerate() {
            let key = prints[id.index()];
            let classes = match table.entry(key) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(SmallVec::new()),
            };
            let existing = classes.iter_mut().find(|class| match policy {
                MergePolicy::Fast => true,
                MergePolicy::Verified => self.same_structure(class.rep, id),
            });
            match existing {
                Some(class) => class.count += 1,
                None => classes.push(Class {
                    rep: id,
                    count: 1,
                    first_seen: order,
                }),
            }
        }

        // Most copies first, then larger subtrees, then the earliest seen, so the
        // choice never depends on hash map iteration order.
        table
            .iter()
            .flat_map(|(key, classes)| classes.iter().map(move |class| (key, class)))
            .filter(|(_, class)| class.count > 1)
            .max_by(|(ka, a), (kb, b)| {
                a.count
                    .cmp(&b.count)
                    .then(ka.size.cmp(&kb.size))
                    .then(b.first_seen.cmp(&a.first_seen))
            })
            .map(|(&key, class)| (key, class.rep, class.count))
    }

    /// Points every edge into a copy of `rep` at `rep` itself. Returns the number
    /// of edges that changed.
    fn redirect(&mut self, prints: &[Fingerprint], key: Fingerprint, rep: NodeId, policy: MergePolicy) -> usize {
        let mut merged = 0;
        for id in self.reachable() {
            for slot in 0..self.node(id).child_count() {
                let child = self.node(id).children()[slot];
                if child == rep || prints[child.index()] != key {
                    continue;
                }
                if policy == MergePolicy::Verified && !self.same_structure(child, rep) {
                    continue;
                }
                self.node_mut(id).children[slot] = rep;
                merged += 1;
            }
        }
        merged
    }
}
