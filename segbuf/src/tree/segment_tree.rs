// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! An AVL balanced order statistics tree of [`Segment`]s.
//!
//! Segments live in the leaves, in address order. Every branch caches the total length
//! of its left and right subtrees, so mapping a relative offset to the leaf containing
//! it is a single descent that carries a running base offset, in `O(log n)`.
//!
//! Nodes live in an arena ([`Vec`]) and refer to each other by [`NodeId`]. Rotations
//! only ever move branches, so the [`NodeId`] of a leaf is stable for the lifetime of
//! the tree. Segments are never removed, a buffer only grows, so the arena never
//! has holes.
//!
//! Any change to structure or to the segment stored in a leaf bumps
//! [`SegmentTree::generation`], which lets cursors know when a cached position hint
//! is stale.

use crate::Segment;

/// Stable identifier of a node in a [`SegmentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy)]
struct Branch {
    left: NodeId,
    right: NodeId,
    left_len: usize,
    right_len: usize,
    height: u32,
}

#[derive(Debug)]
enum NodeKind {
    Leaf(Segment),
    Branch(Branch),
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Default)]
pub struct SegmentTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    leaf_count: usize,
    generation: u64,
}

/// Result of [`SegmentTree::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundLeaf {
    pub leaf: NodeId,
    /// Relative offset of the first byte of the leaf's segment.
    pub base: usize,
    pub len: usize,
}

impl FoundLeaf {
    #[must_use]
    pub fn end(&self) -> usize { self.base + self.len }
}

impl SegmentTree {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.root.is_none() }

    #[must_use]
    pub fn leaf_count(&self) -> usize { self.leaf_count }

    #[must_use]
    pub fn generation(&self) -> u64 { self.generation }

    /// Sum of the lengths of all segments.
    #[must_use]
    pub fn total_len(&self) -> usize { self.root.map_or(0, |it| self.node_len(it)) }

    /// Height of the tree, a lone leaf has height 0.
    #[must_use]
    pub fn height(&self) -> u32 { self.root.map_or(0, |it| self.node_height(it)) }

    #[must_use]
    pub fn segment(&self, leaf: NodeId) -> Option<&Segment> {
        match &self.nodes.get(leaf.0)?.kind {
            NodeKind::Leaf(it) => Some(it),
            NodeKind::Branch(_) => None,
        }
    }

    /// Runs `f` over the segment in `leaf` and then refreshes the cached lengths of all
    /// its ancestors (in case `f` changed the segment's length).
    pub fn modify_segment<R>(&mut self, leaf: NodeId, f: impl FnOnce(&mut Segment) -> R) -> Option<R> {
        let NodeKind::Leaf(segment) = &mut self.nodes.get_mut(leaf.0)?.kind else {
            return None;
        };
        let result = f(segment);
        self.generation += 1;
        self.refresh_lengths(leaf);
        Some(result)
    }

    /// Swaps the segment in `leaf` for `segment` and returns the old one.
    pub fn replace_segment(&mut self, leaf: NodeId, segment: Segment) -> Option<Segment> {
        self.modify_segment(leaf, |it| std::mem::replace(it, segment))
    }

    /// Adds a segment after all others.
    pub fn push_last(&mut self, segment: Segment) -> NodeId {
        match self.last_leaf() {
            Some(last) => self.insert_after(last, segment),
            None => self.push_root(segment),
        }
    }

    /// Adds a segment before all others.
    pub fn push_first(&mut self, segment: Segment) -> NodeId {
        match self.first_leaf() {
            Some(first) => self.insert_before(first, segment),
            None => self.push_root(segment),
        }
    }

    /// Inserts a segment right after `leaf` and rebalances.
    pub fn insert_after(&mut self, leaf: NodeId, segment: Segment) -> NodeId {
        self.insert_beside(leaf, segment, false)
    }

    /// Inserts a segment right before `leaf` and rebalances.
    pub fn insert_before(&mut self, leaf: NodeId, segment: Segment) -> NodeId {
        self.insert_beside(leaf, segment, true)
    }

    /// Splits the segment in `leaf` at `at`. `leaf` keeps the head, the returned leaf
    /// holds the tail.
    pub fn split_leaf(&mut self, leaf: NodeId, at: usize) -> NodeId {
        let tail = self
            .modify_segment(leaf, |it| it.split_off(at))
            .unwrap_or_else(|| panic!("{leaf:?} is not a leaf"));
        self.insert_after(leaf, tail)
    }

    /// Splits the segment in `leaf` so that the bytes `[start, end)` (relative to the
    /// segment) end up in a leaf of their own, which is returned. When `start` is 0 this
    /// is `leaf` itself.
    pub fn isolate(&mut self, leaf: NodeId, start: usize, end: usize) -> NodeId {
        let middle = if start > 0 { self.split_leaf(leaf, start) } else { leaf };
        let middle_len = self.segment(middle).map_or(0, Segment::len);
        if end - start < middle_len {
            self.split_leaf(middle, end - start);
        }
        middle
    }

    /// Locates the leaf that contains relative `offset`, descending from the root with a
    /// running base offset.
    #[must_use]
    pub fn find(&self, offset: usize) -> Option<FoundLeaf> {
        if offset >= self.total_len() {
            return None;
        }
        let mut id = self.root?;
        let mut base = 0;
        loop {
            match &self.nodes[id.0].kind {
                NodeKind::Leaf(segment) => {
                    return Some(FoundLeaf { leaf: id, base, len: segment.len() });
                }
                NodeKind::Branch(branch) => {
                    if offset < base + branch.left_len {
                        id = branch.left;
                    } else {
                        base += branch.left_len;
                        id = branch.right;
                    }
                }
            }
        }
    }

    /// Relative offset of the first byte of `leaf`, computed by climbing to the root.
    #[must_use]
    pub fn leaf_base(&self, leaf: NodeId) -> usize {
        let mut base = 0;
        let mut child = leaf;
        while let Some(parent) = self.nodes[child.0].parent {
            if let NodeKind::Branch(branch) = &self.nodes[parent.0].kind
                && branch.right == child
            {
                base += branch.left_len;
            }
            child = parent;
        }
        base
    }

    #[must_use]
    pub fn first_leaf(&self) -> Option<NodeId> { self.root.map(|it| self.leftmost(it)) }

    #[must_use]
    pub fn last_leaf(&self) -> Option<NodeId> { self.root.map(|it| self.rightmost(it)) }

    #[must_use]
    pub fn next_leaf(&self, leaf: NodeId) -> Option<NodeId> {
        let mut child = leaf;
        while let Some(parent) = self.nodes[child.0].parent {
            let branch = self.branch(parent);
            if branch.left == child {
                return Some(self.leftmost(branch.right));
            }
            child = parent;
        }
        None
    }

    #[must_use]
    pub fn prev_leaf(&self, leaf: NodeId) -> Option<NodeId> {
        let mut child = leaf;
        while let Some(parent) = self.nodes[child.0].parent {
            let branch = self.branch(parent);
            if branch.right == child {
                return Some(self.rightmost(branch.left));
            }
            child = parent;
        }
        None
    }

    /// Leaves in address order.
    #[must_use]
    pub fn iter(&self) -> LeafIter<'_> {
        LeafIter {
            tree: self,
            next: self.first_leaf(),
            base: 0,
        }
    }

    /// Leaves in address order, starting with the one containing relative `offset`.
    #[must_use]
    pub fn iter_from(&self, offset: usize) -> LeafIter<'_> {
        match self.find(offset) {
            Some(found) => LeafIter {
                tree: self,
                next: Some(found.leaf),
                base: found.base,
            },
            None => LeafIter {
                tree: self,
                next: None,
                base: self.total_len(),
            },
        }
    }

    /// Checks every structural invariant: cached lengths match the subtrees, cached
    /// heights are correct, balance factors are within `[-1, 1]`, and parent links are
    /// consistent.
    #[must_use]
    pub fn validate(&self) -> bool {
        match self.root {
            None => self.leaf_count == 0,
            Some(root) => {
                self.nodes[root.0].parent.is_none()
                    && self
                        .validate_node(root)
                        .is_some_and(|(_, _, leaves)| leaves == self.leaf_count)
            }
        }
    }

    /// Returns `(len, height, leaves)` of a valid subtree.
    fn validate_node(&self, id: NodeId) -> Option<(usize, u32, usize)> {
        match &self.nodes[id.0].kind {
            NodeKind::Leaf(segment) => Some((segment.len(), 0, 1)),
            NodeKind::Branch(branch) => {
                if self.nodes[branch.left.0].parent != Some(id)
                    || self.nodes[branch.right.0].parent != Some(id)
                {
                    return None;
                }
                let (left_len, left_height, left_leaves) = self.validate_node(branch.left)?;
                let (right_len, right_height, right_leaves) = self.validate_node(branch.right)?;
                let height = 1 + left_height.max(right_height);
                let balanced = left_height.abs_diff(right_height) <= 1;
                let consistent = branch.left_len == left_len
                    && branch.right_len == right_len
                    && branch.height == height;
                (balanced && consistent)
                    .then_some((left_len + right_len, height, left_leaves + right_leaves))
            }
        }
    }
}

// Structural helpers.
impl SegmentTree {
    fn push_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent, kind });
        id
    }

    fn push_root(&mut self, segment: Segment) -> NodeId {
        let leaf = self.push_node(None, NodeKind::Leaf(segment));
        self.root = Some(leaf);
        self.leaf_count += 1;
        self.generation += 1;
        leaf
    }

    /// Replaces `leaf` with a new branch whose children are `leaf` and a new leaf for
    /// `segment`, then retraces upward from the branch.
    fn insert_beside(&mut self, leaf: NodeId, segment: Segment, before: bool) -> NodeId {
        let parent = self.nodes[leaf.0].parent;
        let new_leaf = self.push_node(None, NodeKind::Leaf(segment));
        let (left, right) = if before { (new_leaf, leaf) } else { (leaf, new_leaf) };
        let branch = self.push_node(
            parent,
            NodeKind::Branch(Branch {
                left,
                right,
                left_len: 0,
                right_len: 0,
                height: 1,
            }),
        );
        self.replace_child(parent, leaf, branch);
        self.nodes[leaf.0].parent = Some(branch);
        self.nodes[new_leaf.0].parent = Some(branch);
        self.retrace(Some(branch));
        self.leaf_count += 1;
        self.generation += 1;
        new_leaf
    }

    /// Makes `new` take the place of `old` as a child of `parent` (or as the root).
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: NodeId) {
        self.nodes[new.0].parent = parent;
        match parent {
            None => self.root = Some(new),
            Some(parent) => {
                if let NodeKind::Branch(branch) = &mut self.nodes[parent.0].kind {
                    if branch.left == old {
                        branch.left = new;
                    } else {
                        branch.right = new;
                    }
                }
            }
        }
    }

    /// Walks from `from` to the root, updating cached values and rebalancing.
    fn retrace(&mut self, from: Option<NodeId>) {
        let mut current = from;
        while let Some(id) = current {
            let top = self.rebalance(id);
            current = self.nodes[top.0].parent;
        }
    }

    /// Walks from the parent of `leaf` to the root, updating cached lengths. Stops as
    /// soon as a node's cached values are already up to date.
    fn refresh_lengths(&mut self, leaf: NodeId) {
        let mut current = self.nodes[leaf.0].parent;
        while let Some(id) = current {
            if !self.update(id) {
                break;
            }
            current = self.nodes[id.0].parent;
        }
    }

    /// Recomputes the cached lengths and height of branch `id` from its children.
    /// Returns `true` if anything changed.
    fn update(&mut self, id: NodeId) -> bool {
        let NodeKind::Branch(branch) = self.nodes[id.0].kind else {
            return false;
        };
        let left_len = self.node_len(branch.left);
        let right_len = self.node_len(branch.right);
        let height = 1 + self.node_height(branch.left).max(self.node_height(branch.right));
        let changed = branch.left_len != left_len
            || branch.right_len != right_len
            || branch.height != height;
        if let NodeKind::Branch(it) = &mut self.nodes[id.0].kind {
            it.left_len = left_len;
            it.right_len = right_len;
            it.height = height;
        }
        changed
    }

    /// Updates `id` and rotates if it is out of balance. Returns the root of the
    /// (possibly rotated) subtree.
    fn rebalance(&mut self, id: NodeId) -> NodeId {
        self.update(id);
        let factor = self.balance_factor(id);
        if factor > 1 {
            let left = self.branch(id).left;
            if self.balance_factor(left) < 0 {
                self.rotate_left(left);
            }
            self.rotate_right(id)
        } else if factor < -1 {
            let right = self.branch(id).right;
            if self.balance_factor(right) > 0 {
                self.rotate_right(right);
            }
            self.rotate_left(id)
        } else {
            id
        }
    }

    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let parent = self.nodes[x.0].parent;
        let y = self.branch(x).right;
        let inner = self.branch(y).left;

        self.set_right(x, inner);
        self.set_left(y, x);
        self.replace_child(parent, x, y);

        self.update(x);
        self.update(y);
        y
    }

    fn rotate_right(&mut self, x: NodeId) -> NodeId {
        let parent = self.nodes[x.0].parent;
        let y = self.branch(x).left;
        let inner = self.branch(y).right;

        self.set_left(x, inner);
        self.set_right(y, x);
        self.replace_child(parent, x, y);

        self.update(x);
        self.update(y);
        y
    }

    fn set_left(&mut self, parent: NodeId, child: NodeId) {
        if let NodeKind::Branch(branch) = &mut self.nodes[parent.0].kind {
            branch.left = child;
        }
        self.nodes[child.0].parent = Some(parent);
    }

    fn set_right(&mut self, parent: NodeId, child: NodeId) {
        if let NodeKind::Branch(branch) = &mut self.nodes[parent.0].kind {
            branch.right = child;
        }
        self.nodes[child.0].parent = Some(parent);
    }

    fn balance_factor(&self, id: NodeId) -> i64 {
        match &self.nodes[id.0].kind {
            NodeKind::Leaf(_) => 0,
            NodeKind::Branch(branch) => {
                i64::from(self.node_height(branch.left)) - i64::from(self.node_height(branch.right))
            }
        }
    }

    /// # Panics
    ///
    /// Panics if `id` is a leaf. Only called on nodes that are known to be branches.
    fn branch(&self, id: NodeId) -> Branch {
        match &self.nodes[id.0].kind {
            NodeKind::Branch(branch) => *branch,
            NodeKind::Leaf(_) => panic!("{id:?} is a leaf, expected a branch"),
        }
    }

    fn node_len(&self, id: NodeId) -> usize {
        match &self.nodes[id.0].kind {
            NodeKind::Leaf(segment) => segment.len(),
            NodeKind::Branch(branch) => branch.left_len + branch.right_len,
        }
    }

    fn node_height(&self, id: NodeId) -> u32 {
        match &self.nodes[id.0].kind {
            NodeKind::Leaf(_) => 0,
            NodeKind::Branch(branch) => branch.height,
        }
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Branch(branch) = &self.nodes[id.0].kind {
            id = branch.left;
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Branch(branch) = &self.nodes[id.0].kind {
            id = branch.right;
        }
        id
    }
}

/// Iterator over `(leaf, base, segment)` in address order.
#[derive(Debug)]
pub struct LeafIter<'a> {
    tree: &'a SegmentTree,
    next: Option<NodeId>,
    base: usize,
}

impl<'a> Iterator for LeafIter<'a> {
    type Item = (NodeId, usize, &'a Segment);

    fn next(&mut self) -> Option<Self::Item> {
        let leaf = self.next?;
        let segment = self.tree.segment(leaf)?;
        let base = self.base;
        self.base += segment.len();
        self.next = self.tree.next_leaf(leaf);
        Some((leaf, base, segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ByteRange, assert_eq2};

    fn zeros(len: usize) -> Segment {
        Segment::sparse(None, ByteRange::new(0, len)).unwrap()
    }

    fn lengths(tree: &SegmentTree) -> Vec<usize> {
        tree.iter().map(|(_, _, it)| it.len()).collect()
    }

    #[test]
    fn test_empty() {
        let tree = SegmentTree::new();
        assert!(tree.is_empty());
        assert!(tree.validate());
        assert_eq2!(tree.total_len(), 0);
        assert_eq2!(tree.find(0), None);
    }

    #[test]
    fn test_push_first_and_last_keep_order() {
        let mut tree = SegmentTree::new();
        tree.push_last(zeros(2));
        tree.push_last(zeros(3));
        tree.push_first(zeros(1));
        tree.push_last(zeros(4));
        assert_eq2!(lengths(&tree), vec![1, 2, 3, 4]);
        assert_eq2!(tree.total_len(), 10);
        assert!(tree.validate());
    }

    #[test]
    fn test_find_maps_offsets_to_leaves() {
        let mut tree = SegmentTree::new();
        for len in [5, 10, 1, 7] {
            tree.push_last(zeros(len));
        }
        let bases: Vec<usize> = [0, 4, 5, 14, 15, 16, 22]
            .iter()
            .filter_map(|&offset| tree.find(offset).map(|it| it.base))
            .collect();
        assert_eq2!(bases, vec![0, 0, 5, 5, 15, 16, 16]);
        assert_eq2!(tree.find(23), None);
    }

    #[test]
    fn test_balanced_after_many_appends() {
        let mut tree = SegmentTree::new();
        for _ in 0..1000 {
            tree.push_last(zeros(1));
        }
        assert!(tree.validate());
        assert_eq2!(tree.leaf_count(), 1000);
        // 1.44 * log2(1000) ~ 14.4
        assert!(tree.height() <= 15, "height {}", tree.height());
        assert_eq2!(tree.find(777).map(|it| it.base), Some(777));
    }

    #[test]
    fn test_balanced_after_many_prepends_and_middle_inserts() {
        let mut tree = SegmentTree::new();
        let anchor = tree.push_last(zeros(1));
        for index in 0..300 {
            tree.push_first(zeros(1));
            if index % 2 == 0 {
                tree.insert_after(anchor, zeros(2));
            } else {
                tree.insert_before(anchor, zeros(3));
            }
        }
        assert!(tree.validate());
        assert_eq2!(tree.total_len(), 1 + 300 + 150 * 2 + 150 * 3);
    }

    #[test]
    fn test_leaf_ids_are_stable_across_rotations() {
        let mut tree = SegmentTree::new();
        let first = tree.push_last(zeros(7));
        for _ in 0..50 {
            tree.push_last(zeros(1));
        }
        assert_eq2!(tree.first_leaf(), Some(first));
        assert_eq2!(tree.segment(first).map(Segment::len), Some(7));
    }

    #[test]
    fn test_next_prev_and_leaf_base() {
        let mut tree = SegmentTree::new();
        let ids: Vec<NodeId> = [3, 4, 5, 6, 7].into_iter().map(|len| tree.push_last(zeros(len))).collect();

        assert_eq2!(tree.next_leaf(ids[1]), Some(ids[2]));
        assert_eq2!(tree.prev_leaf(ids[1]), Some(ids[0]));
        assert_eq2!(tree.prev_leaf(ids[0]), None);
        assert_eq2!(tree.next_leaf(ids[4]), None);

        let bases: Vec<usize> = ids.iter().map(|&it| tree.leaf_base(it)).collect();
        assert_eq2!(bases, vec![0, 3, 7, 12, 18]);
    }

    #[test]
    fn test_isolate_splits_into_three() {
        let mut tree = SegmentTree::new();
        let leaf = tree.push_last(zeros(100));
        let middle = tree.isolate(leaf, 10, 30);
        assert_eq2!(lengths(&tree), vec![10, 20, 70]);
        assert_eq2!(tree.leaf_base(middle), 10);
        assert!(tree.validate());

        // Isolating a prefix keeps the same leaf.
        let head = tree.isolate(leaf, 0, 4);
        assert_eq2!(head, leaf);
        assert_eq2!(lengths(&tree), vec![4, 6, 20, 70]);
    }

    #[test]
    fn test_modify_segment_refreshes_lengths_and_generation() {
        let mut tree = SegmentTree::new();
        let leaf = tree.push_last(zeros(5));
        tree.push_last(zeros(5));
        let generation = tree.generation();

        tree.modify_segment(leaf, |it| it.enlarge_back(None, 10).unwrap());
        assert_eq2!(tree.total_len(), 20);
        assert!(tree.validate());
        assert!(tree.generation() > generation);
    }

    #[test]
    fn test_iter_from() {
        let mut tree = SegmentTree::new();
        for len in [2, 2, 2] {
            tree.push_last(zeros(len));
        }
        let bases: Vec<usize> = tree.iter_from(3).map(|(_, base, _)| base).collect();
        assert_eq2!(bases, vec![2, 4]);
        assert_eq2!(tree.iter_from(6).count(), 0);
    }
}
