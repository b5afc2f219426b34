// SPDX-License-Identifier: Apache-2.0

use crate::{BStarTree, Block};

/// A self-contained floorplan state: block dimensions and positions plus the
/// tree that produced them. Cloning yields an independent copy, which is what
/// rollback and best-solution tracking rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub blocks: Vec<Block>,
    pub tree: BStarTree,
}

impl Snapshot {
    /// Builds the initial tree over `blocks`. Positions are not assigned
    /// until [`Snapshot::pack`] is called.
    pub fn new(blocks: Vec<Block>) -> Self {
        let tree = BStarTree::from_blocks(&blocks);
        Snapshot { blocks, tree }
    }

    pub fn pack(&mut self) {
        self.tree.pack(&mut self.blocks);
    }
}
