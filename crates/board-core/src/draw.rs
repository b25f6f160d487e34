//! Presentation-boundary types consumed by the rendering collaborator.
//!
//! The windowing/widget layer is out of scope; it supplies an
//! [`InputState`] per frame and renders the [`Shape`]s devices emit. The
//! one deliberate exception to the read-only contract is input-capable
//! devices (the button), which sample the frame input during their draw
//! call and write it into their own state.

use std::ops::{Add, Mul, Sub};

/// 2D point or extent in board-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vec2 {
    /// Creates a point from its components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }
}

/// A draw primitive emitted by a device's draw hook.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Filled axis-aligned rectangle.
    Rect {
        /// Top-left corner.
        min: Vec2,
        /// Bottom-right corner.
        max: Vec2,
        /// Fill color.
        color: Color,
    },
    /// Filled circle.
    Circle {
        /// Center point.
        center: Vec2,
        /// Radius in pixels.
        radius: f32,
        /// Fill color.
        color: Color,
    },
    /// Line segment.
    Line {
        /// Start point.
        from: Vec2,
        /// End point.
        to: Vec2,
        /// Stroke color.
        color: Color,
        /// Stroke thickness in pixels.
        thickness: f32,
    },
    /// Text anchored at a point.
    Text {
        /// Anchor position.
        pos: Vec2,
        /// Text color.
        color: Color,
        /// The text itself.
        text: String,
    },
}

/// Input snapshot supplied by the windowing layer for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    /// Pointer position in board pixels.
    pub pointer: Vec2,
    /// `true` while the primary button is held.
    pub primary_down: bool,
}

/// One frame: the input snapshot plus the shape sink devices draw into.
#[derive(Debug, Default)]
pub struct Frame {
    input: InputState,
    shapes: Vec<Shape>,
}

impl Frame {
    /// Starts a frame from an input snapshot.
    #[must_use]
    pub const fn new(input: InputState) -> Self {
        Self {
            input,
            shapes: Vec::new(),
        }
    }

    /// The frame's input snapshot.
    #[must_use]
    pub const fn input(&self) -> InputState {
        self.input
    }

    /// Emits a shape.
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Shapes emitted so far, in paint order.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// `true` when the pointer lies inside the rectangle.
    #[must_use]
    pub fn hovered(&self, min: Vec2, max: Vec2) -> bool {
        let p = self.input.pointer;
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }
}
