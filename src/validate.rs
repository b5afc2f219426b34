// SPDX-License-Identifier: Apache-2.0

use itertools::Itertools;

use crate::{BStarTree, Block, Outline};

pub mod overlap;

/// Returns `true` if every block's upper-right corner lies inside the
/// outline.
pub fn outline_valid(blocks: &[Block], outline: &Outline) -> bool {
    blocks.iter().all(|b| b.rect().is_within(outline))
}

/// Returns `true` if any two distinct blocks overlap. Checks all pairs.
pub fn has_overlap(blocks: &[Block]) -> bool {
    blocks
        .iter()
        .tuple_combinations()
        .any(|(a, b)| a.rect().overlaps(&b.rect()))
}

/// A placement is feasible when it fits the outline and has no overlaps.
pub fn is_feasible(blocks: &[Block], outline: &Outline) -> bool {
    outline_valid(blocks, outline) && !has_overlap(blocks)
}

/// Diagnostic check of the tree's parent/child links. Not used to gate the
/// search.
pub fn tree_consistent(tree: &BStarTree) -> bool {
    match tree.check_consistency() {
        Ok(()) => true,
        Err(err) => {
            log::debug!("Inconsistent tree: {err}");
            false
        }
    }
}

/// Names of blocks whose rectangle extends past the outline.
pub fn blocks_outside(blocks: &[Block], outline: &Outline) -> Vec<String> {
    blocks
        .iter()
        .filter(|b| !b.rect().is_within(outline))
        .map(|b| b.name().to_string())
        .collect()
}

/// Logs why a placement is infeasible.
pub fn report_violations(blocks: &[Block], outline: &Outline) {
    let outside = blocks_outside(blocks, outline);
    if !outside.is_empty() {
        log::warn!(
            "{} block(s) exceed the {}x{} outline: {}",
            outside.len(),
            outline.width,
            outline.height,
            outside.join(", ")
        );
    }
    for (i, j) in overlap::overlapping_pairs(blocks) {
        log::warn!(
            "Blocks {} and {} overlap",
            blocks[i].name(),
            blocks[j].name()
        );
    }
}
