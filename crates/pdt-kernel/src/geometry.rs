// SPDX-License-Identifier: Apache-2.0
//! Plain planar point and direction types.

use pdt_interval::RoundedScalar;

/// A point in the plane.
///
/// Coordinates are whatever scalar the kernel is instantiated with; callers
/// must keep them finite (the OFF reader enforces this at the boundary).
/// Equality is componentwise.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Point2<R> {
    x: R,
    y: R,
}

impl<R: RoundedScalar> Point2<R> {
    /// Creates a point from its coordinates.
    pub const fn new(x: R, y: R) -> Self {
        Self { x, y }
    }

    /// The x coordinate.
    #[must_use]
    pub fn x(&self) -> R {
        self.x
    }

    /// The y coordinate.
    #[must_use]
    pub fn y(&self) -> R {
        self.y
    }
}

/// A direction in the plane.
///
/// Semantically a free vector: it has no anchor point and is never
/// normalised. The preferred-direction predicate only ever compares squared
/// projections, so magnitude is irrelevant to every consumer in this
/// workspace.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vector2<R> {
    x: R,
    y: R,
}

impl<R: RoundedScalar> Vector2<R> {
    /// Creates a vector from its components.
    pub const fn new(x: R, y: R) -> Self {
        Self { x, y }
    }

    /// The x component.
    #[must_use]
    pub fn x(&self) -> R {
        self.x
    }

    /// The y component.
    #[must_use]
    pub fn y(&self) -> R {
        self.y
    }
}
