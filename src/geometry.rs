// SPDX-License-Identifier: Apache-2.0

use crate::ParseError;

/// Largest block dimension, terminal coordinate magnitude and total packed
/// extent accepted from input. Keeps every coordinate, area and wirelength
/// sum well inside `i64`.
pub const MAX_COORDINATE: i64 = 1 << 30;

/// Axis-aligned rectangle in database units. `min` is inclusive and `max` is
/// exclusive when testing for overlap, so abutting rectangles do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl Rect {
    pub fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Rect {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Degenerate rectangle at a single point.
    pub fn point(x: i64, y: i64) -> Self {
        Rect::new(x, y, x, y)
    }

    pub fn width(&self) -> i64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> i64 {
        self.width().saturating_mul(self.height())
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Returns `true` if both the x-intervals and the y-intervals of the two
    /// rectangles strictly intersect. Shared edges and corners do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Returns `true` if the upper-right corner lies inside the outline.
    pub fn is_within(&self, outline: &Outline) -> bool {
        self.max_x <= outline.width && self.max_y <= outline.height
    }
}

/// The fixed target rectangle, anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outline {
    pub width: i64,
    pub height: i64,
}

impl Outline {
    pub fn new(width: i64, height: i64) -> Self {
        Outline { width, height }
    }

    pub fn area(&self) -> i64 {
        self.width * self.height
    }
}

/// Fixed I/O pin. Its rectangle is degenerate (a single point).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    name: String,
    x: i64,
    y: i64,
}

impl Terminal {
    pub fn new(name: impl Into<String>, x: i64, y: i64) -> Self {
        Terminal {
            name: name.into(),
            x,
            y,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rect(&self) -> Rect {
        Rect::point(self.x, self.y)
    }

    pub fn set_position(&mut self, x: i64, y: i64) {
        self.x = x;
        self.y = y;
    }
}

/// Hard rectangular module. The lower-left corner is assigned by packing; the
/// upper-right corner is derived from the current width and height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    name: String,
    width: i64,
    height: i64,
    x: i64,
    y: i64,
}

impl Block {
    /// Creates a block at the origin. Both dimensions must be positive and
    /// no larger than [`MAX_COORDINATE`].
    pub fn new(name: impl Into<String>, width: i64, height: i64) -> Result<Self, ParseError> {
        let name = name.into();
        if width <= 0 || height <= 0 {
            return Err(ParseError::NonPositiveDimension {
                name,
                width,
                height,
            });
        }
        if width > MAX_COORDINATE || height > MAX_COORDINATE {
            return Err(ParseError::DimensionTooLarge {
                name,
                width,
                height,
                limit: MAX_COORDINATE,
            });
        }
        Ok(Block {
            name,
            width,
            height,
            x: 0,
            y: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn area(&self) -> i64 {
        self.width * self.height
    }

    pub fn origin(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    pub fn set_origin(&mut self, x: i64, y: i64) {
        self.x = x;
        self.y = y;
    }

    /// Rotates the block by 90 degrees in place.
    pub fn rotate(&mut self) {
        std::mem::swap(&mut self.width, &mut self.height);
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Reference from a net to an entry of the design's block or terminal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinRef {
    Block(usize),
    Terminal(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Net {
    pins: Vec<PinRef>,
}

impl Net {
    pub fn new(pins: Vec<PinRef>) -> Self {
        Net { pins }
    }

    pub fn pins(&self) -> &[PinRef] {
        &self.pins
    }

    pub fn degree(&self) -> usize {
        self.pins.len()
    }

    pub fn add_pin(&mut self, pin: PinRef) {
        self.pins.push(pin);
    }
}
