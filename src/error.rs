// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read a block or net description.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: invalid {field} '{value}'")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: expected '{expected}', found '{found}'")]
    UnexpectedToken {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: unexpected trailing field '{found}'")]
    TrailingField { line: usize, found: String },

    #[error("unexpected end of input while reading {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("block '{name}' has non-positive dimensions {width}x{height}")]
    NonPositiveDimension {
        name: String,
        width: i64,
        height: i64,
    },

    #[error("block '{name}' dimensions {width}x{height} exceed the limit of {limit}")]
    DimensionTooLarge {
        name: String,
        width: i64,
        height: i64,
        limit: i64,
    },

    #[error("line {line}: blocks stacked end to end would exceed the coordinate limit of {limit}")]
    ExtentTooLarge { line: usize, limit: i64 },

    #[error("line {line}: {field} {value} lies outside [-{limit}, {limit}]")]
    CoordinateOutOfRange {
        line: usize,
        field: &'static str,
        value: i64,
        limit: i64,
    },

    #[error("line {line}: outline must have positive dimensions, got {width}x{height}")]
    InvalidOutline { line: usize, width: i64, height: i64 },

    #[error("line {line}: {field} must not be negative, got {value}")]
    NegativeCount {
        line: usize,
        field: &'static str,
        value: i64,
    },
}

/// Structural defect found by [`crate::BStarTree::check_consistency`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("tree has no root")]
    MissingRoot,

    #[error("root node {0} has a parent")]
    RootHasParent(usize),

    #[error("node {child} is linked under {parent} but points back to {actual:?}")]
    BrokenBackLink {
        parent: usize,
        child: usize,
        actual: Option<usize>,
    },

    #[error("node {0} is reachable more than once")]
    Cycle(usize),

    #[error("node {0} is not reachable from the root")]
    Unreachable(usize),

    #[error("node {0} links to out-of-range node {1}")]
    OutOfRange(usize, usize),
}

#[derive(Debug, Error)]
pub enum FloorplanError {
    #[error("cannot open '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("alpha must lie in [0, 1], got {0}")]
    InvalidAlpha(f64),
}
