// SPDX-License-Identifier: Apache-2.0

use rand::Rng;

use crate::{BStarTree, Block, Side};

/// Upper bound on random draws an operator makes before giving up and
/// leaving the tree untouched for this iteration.
pub const MAX_PERTURB_ATTEMPTS: usize = 64;

/// Edits applied to a floorplan between two packings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Perturbation {
    Rotate,
    Move,
    Swap,
}

impl Perturbation {
    pub const ALL: [Perturbation; 3] = [
        Perturbation::Rotate,
        Perturbation::Move,
        Perturbation::Swap,
    ];

    /// Picks one of the three operators uniformly.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Perturbation::ALL[rng.random_range(0..Perturbation::ALL.len())]
    }

    /// Applies the operator. Returns `false` if it turned out to be a no-op.
    /// The caller is responsible for repacking afterwards.
    pub fn apply<R: Rng>(
        &self,
        tree: &mut BStarTree,
        blocks: &mut [Block],
        rng: &mut R,
    ) -> bool {
        match self {
            Perturbation::Rotate => rotate(blocks, rng),
            Perturbation::Move => move_subtree(tree, rng),
            Perturbation::Swap => swap(tree, rng),
        }
    }
}

/// Rotates a uniformly chosen block by 90 degrees.
pub fn rotate<R: Rng>(blocks: &mut [Block], rng: &mut R) -> bool {
    if blocks.is_empty() {
        return false;
    }
    let id = rng.random_range(0..blocks.len());
    blocks[id].rotate();
    true
}

/// Relocates a random non-root node, together with its subtree, under a
/// random destination node that has a free child slot and does not lie in
/// the moved subtree.
pub fn move_subtree<R: Rng>(tree: &mut BStarTree, rng: &mut R) -> bool {
    let n = tree.len();
    if n < 2 {
        return false;
    }

    for _ in 0..MAX_PERTURB_ATTEMPTS {
        let target = rng.random_range(0..n);
        let dest = rng.random_range(0..n);

        if target == dest
            || tree.node(target).parent.is_none()
            || tree.is_descendant(dest, target)
        {
            continue;
        }

        let dest_node = tree.node(dest);
        let side = match (dest_node.left, dest_node.right) {
            (None, None) => {
                if rng.random_bool(0.5) {
                    Side::Left
                } else {
                    Side::Right
                }
            }
            (None, Some(_)) => Side::Left,
            (Some(_), None) => Side::Right,
            (Some(_), Some(_)) => continue,
        };

        tree.detach(target);
        tree.attach(target, dest, side);
        return true;
    }

    false
}

/// Exchanges the tree positions of two distinct non-root nodes. Pairs where
/// one node is the direct parent of the other are skipped.
pub fn swap<R: Rng>(tree: &mut BStarTree, rng: &mut R) -> bool {
    let n = tree.len();
    if n < 3 {
        return false;
    }

    for _ in 0..MAX_PERTURB_ATTEMPTS {
        let a = rng.random_range(0..n);
        let b = rng.random_range(0..n);

        if a == b || tree.root() == Some(a) || tree.root() == Some(b) {
            continue;
        }
        if tree.node(a).parent == Some(b) || tree.node(b).parent == Some(a) {
            return false;
        }

        tree.swap_nodes(a, b);
        return true;
    }

    false
}
