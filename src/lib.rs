// SPDX-License-Identifier: Apache-2.0

//! Fixed-outline floorplanning. Blocks are arranged by a B*-tree whose shape
//! is searched with simulated annealing to minimize a weighted sum of chip
//! area and half-perimeter wirelength.

mod anneal;
pub use anneal::{
    AnnealOptions, AnnealState, Annealer, FloorplanResult, SearchStats, StepOutcome, accept,
    acceptance_probability, floorplan,
};

mod cost;
pub use cost::{CostModel, Evaluation, Normalization, area, bounding_box, hpwl, wirelength};

mod design;
pub use design::Design;

mod error;
pub use error::{FloorplanError, ParseError, TreeError};

mod geometry;
pub use geometry::{Block, MAX_COORDINATE, Net, Outline, PinRef, Rect, Terminal};

pub mod parse;

mod perturb;
pub use perturb::{MAX_PERTURB_ATTEMPTS, Perturbation, move_subtree, rotate, swap};

mod report;
pub use report::{PlacedBlock, Report};

mod snapshot;
pub use snapshot::Snapshot;

mod tree;
pub use tree::{BStarTree, Side, TreeNode};

pub mod validate;
