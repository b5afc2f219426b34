// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::{Block, TreeError};

/// Which child slot of a parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Packed to the right of the parent (adjacent in x).
    Left,
    /// Packed above the parent (stacked in y).
    Right,
}

/// Links of one tree node. The node itself is addressed by block id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeNode {
    pub parent: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl TreeNode {
    pub fn child(&self, side: Side) -> Option<usize> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn child_mut(&mut self, side: Side) -> &mut Option<usize> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn is_full(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// B*-tree over block ids, stored as an arena so that cloning the tree
/// produces a fully independent copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BStarTree {
    root: Option<usize>,
    nodes: Vec<TreeNode>,
}

impl BStarTree {
    /// Builds a complete binary tree in level order: node `i` has children
    /// `2i + 1` (left) and `2i + 2` (right). Node 0 is the root.
    pub fn build(num_blocks: usize) -> Self {
        let mut nodes = vec![TreeNode::default(); num_blocks];
        for (i, node) in nodes.iter_mut().enumerate() {
            if i > 0 {
                node.parent = Some((i - 1) / 2);
            }
            node.left = Some(2 * i + 1).filter(|&c| c < num_blocks);
            node.right = Some(2 * i + 2).filter(|&c| c < num_blocks);
        }
        BStarTree {
            root: if num_blocks > 0 { Some(0) } else { None },
            nodes,
        }
    }

    pub fn from_blocks(blocks: &[Block]) -> Self {
        BStarTree::build(blocks.len())
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: usize) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Returns the side of `parent` that holds `child`, if they are linked.
    pub fn side_of(&self, parent: usize, child: usize) -> Option<Side> {
        let p = &self.nodes[parent];
        if p.left == Some(child) {
            Some(Side::Left)
        } else if p.right == Some(child) {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Returns `true` if `node` lies in the subtree rooted at `ancestor`
    /// (a node is its own descendant).
    pub fn is_descendant(&self, node: usize, ancestor: usize) -> bool {
        let mut curr = Some(node);
        let mut steps = 0;
        while let Some(id) = curr {
            if id == ancestor {
                return true;
            }
            // guards against cycles in a corrupted tree
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            curr = self.nodes[id].parent;
        }
        false
    }

    /// Unlinks `id` (with its whole subtree) from its parent.
    pub fn detach(&mut self, id: usize) {
        if let Some(parent) = self.nodes[id].parent.take()
            && let Some(side) = self.side_of(parent, id)
        {
            *self.nodes[parent].child_mut(side) = None;
        }
    }

    /// Links a detached node under `parent`. The slot must be free.
    pub fn attach(&mut self, id: usize, parent: usize, side: Side) {
        debug_assert!(self.nodes[id].parent.is_none());
        debug_assert!(self.nodes[parent].child(side).is_none());
        *self.nodes[parent].child_mut(side) = Some(id);
        self.nodes[id].parent = Some(parent);
    }

    /// Exchanges the tree positions of two non-root nodes, neither of which
    /// is the direct parent of the other. Each node takes over the other's
    /// parent and children.
    pub fn swap_nodes(&mut self, a: usize, b: usize) {
        debug_assert_ne!(a, b);
        debug_assert!(self.root != Some(a) && self.root != Some(b));
        debug_assert!(self.nodes[a].parent != Some(b) && self.nodes[b].parent != Some(a));

        let node_a = self.nodes[a];
        let node_b = self.nodes[b];
        let side_a = node_a.parent.and_then(|p| self.side_of(p, a));
        let side_b = node_b.parent.and_then(|p| self.side_of(p, b));

        self.nodes[a] = node_b;
        self.nodes[b] = node_a;

        // siblings under one parent occupy different sides, so both writes land
        if let (Some(p), Some(side)) = (node_a.parent, side_a) {
            *self.nodes[p].child_mut(side) = Some(b);
        }
        if let (Some(p), Some(side)) = (node_b.parent, side_b) {
            *self.nodes[p].child_mut(side) = Some(a);
        }

        for child in [node_a.left, node_a.right].into_iter().flatten() {
            self.nodes[child].parent = Some(b);
        }
        for child in [node_b.left, node_b.right].into_iter().flatten() {
            self.nodes[child].parent = Some(a);
        }
    }

    /// Assigns block coordinates from the tree shape. The root sits at the
    /// origin; a left child is placed at `(x + width, y)` and a right child at
    /// `(x, y + height)` of its parent. No contour is tracked, so subtrees may
    /// overlap; overlap is detected separately.
    pub fn pack(&self, blocks: &mut [Block]) {
        debug_assert_eq!(blocks.len(), self.nodes.len());
        for block in blocks.iter_mut() {
            block.set_origin(0, 0);
        }

        let Some(root) = self.root else {
            return;
        };

        let mut stack = vec![(root, 0i64, 0i64)];
        while let Some((id, x, y)) = stack.pop() {
            blocks[id].set_origin(x, y);
            let node = &self.nodes[id];
            // push right first so the left subtree is visited first
            if let Some(right) = node.right {
                stack.push((right, x, y + blocks[id].height()));
            }
            if let Some(left) = node.left {
                stack.push((left, x + blocks[id].width(), y));
            }
        }
    }

    /// Verifies bidirectional parent/child links, a single parentless root,
    /// reachability of every node and absence of cycles.
    pub fn check_consistency(&self) -> Result<(), TreeError> {
        let n = self.nodes.len();
        let Some(root) = self.root else {
            return if n == 0 {
                Ok(())
            } else {
                Err(TreeError::MissingRoot)
            };
        };
        if root >= n {
            return Err(TreeError::OutOfRange(root, root));
        }
        if self.nodes[root].parent.is_some() {
            return Err(TreeError::RootHasParent(root));
        }

        let mut seen = vec![false; n];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if seen[id] {
                return Err(TreeError::Cycle(id));
            }
            seen[id] = true;
            let node = &self.nodes[id];
            for child in [node.left, node.right].into_iter().flatten() {
                if child >= n {
                    return Err(TreeError::OutOfRange(id, child));
                }
                if self.nodes[child].parent != Some(id) {
                    return Err(TreeError::BrokenBackLink {
                        parent: id,
                        child,
                        actual: self.nodes[child].parent,
                    });
                }
                stack.push(child);
            }
        }

        match seen.iter().position(|&s| !s) {
            Some(id) => Err(TreeError::Unreachable(id)),
            None => Ok(()),
        }
    }

    fn fmt_subtree(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: usize,
        prefix: &str,
        label: &str,
    ) -> fmt::Result {
        writeln!(f, "{prefix}{label}{id}")?;
        let node = &self.nodes[id];
        let indent = format!("{prefix}  ");
        if let Some(left) = node.left {
            self.fmt_subtree(f, left, &indent, "L ")?;
        }
        if let Some(right) = node.right {
            self.fmt_subtree(f, right, &indent, "R ")?;
        }
        Ok(())
    }
}

impl fmt::Display for BStarTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.fmt_subtree(f, root, "", ""),
            None => writeln!(f, "(empty)"),
        }
    }
}
