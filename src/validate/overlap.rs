// SPDX-License-Identifier: Apache-2.0

use rstar::{AABB, RTree, RTreeObject};

use crate::Block;

struct BBoxWrapper {
    index: usize,
    envelope: AABB<[i64; 2]>,
}

impl RTreeObject for BBoxWrapper {
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Returns every pair `(i, j)` with `i < j` whose blocks overlap, using an
/// R-tree to prune candidate pairs.
pub fn overlapping_pairs(blocks: &[Block]) -> Vec<(usize, usize)> {
    if blocks.len() < 2 {
        return Vec::new();
    }

    let rects = blocks.iter().map(Block::rect).collect::<Vec<_>>();

    // rtree of all block rectangles, maintaining the original index for each
    let rtree = RTree::bulk_load(
        rects
            .iter()
            .enumerate()
            .map(|(index, r)| BBoxWrapper {
                index,
                envelope: AABB::from_corners([r.min_x, r.min_y], [r.max_x, r.max_y]),
            })
            .collect::<Vec<_>>(),
    );

    let mut pairs = Vec::new();
    for (i, r) in rects.iter().enumerate() {
        let aabb = AABB::from_corners([r.min_x, r.min_y], [r.max_x, r.max_y]);
        for candidate in rtree.locate_in_envelope_intersecting(&aabb) {
            let j = candidate.index;

            // report each pair once
            if j <= i {
                continue;
            }

            // the rtree counts abutted rectangles as intersecting
            if r.overlaps(&rects[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}
