// SPDX-License-Identifier: Apache-2.0

use rand::Rng;

use crate::{Block, Design, FloorplanError, Net, Perturbation, Rect, Snapshot};

/// Bounding box of all blocks, anchored at the origin.
pub fn bounding_box(blocks: &[Block]) -> Rect {
    let max_x = blocks.iter().map(|b| b.rect().max_x).max().unwrap_or(0);
    let max_y = blocks.iter().map(|b| b.rect().max_y).max().unwrap_or(0);
    Rect::new(0, 0, max_x, max_y)
}

/// Chip area: `max x2 * max y2` over all blocks.
pub fn area(blocks: &[Block]) -> i64 {
    bounding_box(blocks).area()
}

/// Half-perimeter wirelength of one net over the rectangles of its pins.
/// Nets with fewer than two pins contribute nothing.
pub fn hpwl(net: &Net, design: &Design, blocks: &[Block]) -> i64 {
    if net.degree() < 2 {
        return 0;
    }
    let bbox = net
        .pins()
        .iter()
        .map(|&pin| design.pin_rect(pin, blocks))
        .reduce(|acc, r| acc.union(&r));
    match bbox {
        Some(r) => r.width() + r.height(),
        None => 0,
    }
}

/// Total half-perimeter wirelength over all nets of the design.
pub fn wirelength(design: &Design, blocks: &[Block]) -> i64 {
    design.nets().iter().map(|n| hpwl(n, design, blocks)).sum()
}

/// Mean area and wirelength over a random walk, used to bring both terms of
/// the cost onto a comparable scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub area: f64,
    pub wirelength: f64,
}

impl Default for Normalization {
    fn default() -> Self {
        Normalization {
            area: 1.0,
            wirelength: 1.0,
        }
    }
}

impl Normalization {
    /// Applies `samples` random perturbations to `state`, repacking after
    /// each, and averages the resulting area and wirelength. `state` is
    /// restored before returning. A mean that is not strictly positive (no
    /// samples, or no nets) is replaced by 1.0.
    pub fn sample<R: Rng>(
        design: &Design,
        state: &mut Snapshot,
        samples: usize,
        rng: &mut R,
    ) -> Self {
        let saved = state.clone();
        let mut area_sum = 0.0;
        let mut wirelength_sum = 0.0;

        for _ in 0..samples {
            Perturbation::random(rng).apply(&mut state.tree, &mut state.blocks, rng);
            state.pack();
            area_sum += area(&state.blocks) as f64;
            wirelength_sum += wirelength(design, &state.blocks) as f64;
        }

        *state = saved;

        let mean = |sum: f64| {
            let m = if samples > 0 { sum / samples as f64 } else { 0.0 };
            if m > 0.0 { m } else { 1.0 }
        };
        let norm = Normalization {
            area: mean(area_sum),
            wirelength: mean(wirelength_sum),
        };
        log::debug!(
            "Normalization over {} samples: area {:.3}, wirelength {:.3}",
            samples,
            norm.area,
            norm.wirelength
        );
        norm
    }
}

/// Cost figures of one packed floorplan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub cost: f64,
    pub area: i64,
    pub wirelength: i64,
    pub width: i64,
    pub height: i64,
}

/// Weighted, normalized combination of chip area and wirelength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    alpha: f64,
    norm: Normalization,
}

impl CostModel {
    pub fn new(alpha: f64, norm: Normalization) -> Result<Self, FloorplanError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(FloorplanError::InvalidAlpha(alpha));
        }
        Ok(CostModel { alpha, norm })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn normalization(&self) -> Normalization {
        self.norm
    }

    pub fn cost(&self, area: i64, wirelength: i64) -> f64 {
        self.alpha * (area as f64 / self.norm.area)
            + (1.0 - self.alpha) * (wirelength as f64 / self.norm.wirelength)
    }

    pub fn evaluate(&self, design: &Design, blocks: &[Block]) -> Evaluation {
        let bbox = bounding_box(blocks);
        let area = bbox.area();
        let wirelength = wirelength(design, blocks);
        Evaluation {
            cost: self.cost(area, wirelength),
            area,
            wirelength,
            width: bbox.width(),
            height: bbox.height(),
        }
    }
}
