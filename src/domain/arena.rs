use std::collections::{HashMap, HashSet};
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{MemberId, MemberNode, MemberRecord};

/// Node in the arena-based forest.
#[derive(Debug)]
pub struct ForestNode {
    /// Member record carried by this node
    pub record: MemberRecord,
    /// Index of parent node in the arena, None for roots and detached nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in attachment order
    pub children: Vec<Index>,
}

impl fmt::Display for ForestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.record.id)
    }
}

/// Arena-based forest of heir/member records.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Nodes are either reachable from one of the roots or detached; detached
/// nodes are kept so validation can report them, but traversals never see them.
#[derive(Debug, Default)]
pub struct HeirForest {
    /// Arena storage for all nodes
    arena: Arena<ForestNode>,
    /// Root nodes in the order they were collected
    roots: Vec<Index>,
    /// Node lookup by member id
    by_id: HashMap<MemberId, Index>,
}

impl HeirForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            roots: Vec::new(),
            by_id: HashMap::with_capacity(capacity),
        }
    }

    /// Store a record without linking it anywhere yet.
    #[instrument(level = "trace", skip(self, record), fields(id = %record.id))]
    pub fn insert_detached(&mut self, record: MemberRecord) -> Index {
        let id = record.id.clone();
        let idx = self.arena.insert(ForestNode {
            record,
            parent: None,
            children: Vec::new(),
        });
        self.by_id.insert(id, idx);
        idx
    }

    /// Append `child` to the children of `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn attach(&mut self, child: Index, parent: Index) {
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(child);
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn push_root(&mut self, idx: Index) {
        self.roots.push(idx);
    }

    pub fn get_node(&self, idx: Index) -> Option<&ForestNode> {
        self.arena.get(idx)
    }

    /// Arena handle of the member with `id`.
    pub fn lookup(&self, id: &MemberId) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn find(&self, id: &MemberId) -> Option<&ForestNode> {
        self.lookup(id).and_then(|idx| self.arena.get(idx))
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    /// Root records in collection order.
    pub fn root_records(&self) -> Vec<&MemberRecord> {
        self.roots
            .iter()
            .filter_map(|&idx| self.arena.get(idx))
            .map(|node| &node.record)
            .collect()
    }

    /// Number of stored nodes, reachable or not.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Number of nodes reachable from the roots.
    pub fn reachable_count(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order traversal over all trees, roots left to right.
    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Pre-order traversal yielding each node with its level (roots are 0).
    pub fn iter_levels(&self) -> LevelIterator<'_> {
        LevelIterator::new(self)
    }

    /// Number of levels in the deepest tree; 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter_levels()
            .map(|(level, _, _)| level + 1)
            .max()
            .unwrap_or(0)
    }

    /// Reachable members without children, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<&MemberRecord> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| &node.record)
            .collect()
    }

    /// Every root-to-leaf lineage, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn branches(&self) -> Vec<Vec<&MemberRecord>> {
        let mut branches = Vec::new();
        let mut path: Vec<&MemberRecord> = Vec::new();
        for (level, _, node) in self.iter_levels() {
            path.truncate(level);
            path.push(&node.record);
            if node.children.is_empty() {
                branches.push(path.clone());
            }
        }
        branches
    }

    /// Parent chain of `id`, nearest first. Stops at a root or a revisited node.
    pub fn ancestors(&self, id: &MemberId) -> Vec<&MemberRecord> {
        let mut chain = Vec::new();
        let Some(start) = self.lookup(id) else {
            return chain;
        };
        let mut seen = HashSet::from([start]);
        let mut current = self.get_node(start).and_then(|n| n.parent);
        while let Some(idx) = current {
            if !seen.insert(idx) {
                break;
            }
            match self.get_node(idx) {
                Some(node) => {
                    chain.push(&node.record);
                    current = node.parent;
                }
                None => break,
            }
        }
        chain
    }

    /// Stored members that no root reaches, in arena order.
    ///
    /// These are the members of parent cycles plus everything descending
    /// from them; see [`HeirForest::cycle_members`] to tell them apart.
    pub fn unreachable(&self) -> Vec<&MemberRecord> {
        let reachable: HashSet<Index> = self.iter().map(|(idx, _)| idx).collect();
        self.arena
            .iter()
            .filter(|(idx, _)| !reachable.contains(idx))
            .map(|(_, node)| &node.record)
            .collect()
    }

    /// Members whose parent chain leads back to themselves, in arena order.
    pub fn cycle_members(&self) -> Vec<&MemberRecord> {
        // Parent chains are walked once each: nodes on the current chain are
        // `false`, finished ones `true`.
        let mut state: HashMap<Index, bool> = HashMap::with_capacity(self.arena.len());
        let mut on_cycle: HashSet<Index> = HashSet::new();

        for (start, _) in self.arena.iter() {
            let mut chain = Vec::new();
            let mut current = Some(start);
            while let Some(idx) = current {
                match state.get(&idx) {
                    Some(true) => break,
                    Some(false) => {
                        if let Some(pos) = chain.iter().position(|&c| c == idx) {
                            on_cycle.extend(chain[pos..].iter().copied());
                        }
                        break;
                    }
                    None => {
                        state.insert(idx, false);
                        chain.push(idx);
                        current = self.get_node(idx).and_then(|n| n.parent);
                    }
                }
            }
            for idx in chain {
                state.insert(idx, true);
            }
        }

        self.arena
            .iter()
            .filter(|(idx, _)| on_cycle.contains(idx))
            .map(|(_, node)| &node.record)
            .collect()
    }

    /// Owned nested view of every tree, for renderers and JSON output.
    ///
    /// Built bottom-up from the post-order walk, so lineage depth is bounded
    /// by memory, not by the call stack.
    pub fn to_nodes(&self) -> Vec<MemberNode> {
        let mut built: HashMap<Index, MemberNode> = HashMap::new();
        for (idx, node) in self.iter_postorder() {
            let children = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            let mut record = node.record.clone();
            record.attributes.strip_reserved();
            built.insert(idx, MemberNode { record, children });
        }
        self.roots
            .iter()
            .filter_map(|root| built.remove(root))
            .collect()
    }
}

pub struct ForestIterator<'a> {
    forest: &'a HeirForest,
    stack: Vec<Index>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a HeirForest) -> Self {
        // Roots reversed so the first root pops first
        let stack = forest.roots.iter().rev().copied().collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (Index, &'a ForestNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct LevelIterator<'a> {
    forest: &'a HeirForest,
    stack: Vec<(Index, usize)>,
}

impl<'a> LevelIterator<'a> {
    fn new(forest: &'a HeirForest) -> Self {
        let stack = forest.roots.iter().rev().map(|&r| (r, 0)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for LevelIterator<'a> {
    type Item = (usize, Index, &'a ForestNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, level)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                for &child in node.children.iter().rev() {
                    self.stack.push((child, level + 1));
                }
                return Some((level, current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    forest: &'a HeirForest,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(forest: &'a HeirForest) -> Self {
        let stack = forest.roots.iter().rev().map(|&r| (r, false)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a ForestNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
