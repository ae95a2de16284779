// SPDX-License-Identifier: Apache-2.0
//! Decision-exact planar geometry predicates.
//!
//! The kernel answers three sign questions about points in the plane
//! ([`Kernel::orientation`], [`Kernel::side_of_oriented_circle`], and
//! [`Kernel::preferred_direction`]) and composes them into the quadrilateral
//! and edge tests a Delaunay flipping engine needs. Every answer is the
//! *exact* sign of a polynomial in the input coordinates, independent of
//! floating-point error.
//!
//! Exactness comes from a two-stage filter: each defining determinant is
//! first evaluated in outward-rounded interval arithmetic
//! ([`pdt_interval::Interval`]); when the interval excludes zero its sign is
//! provably correct and the answer is free. Only when the interval straddles
//! zero does the kernel re-evaluate the identical polynomial over
//! arbitrary-precision rationals. Process-wide counters record how often the
//! filter missed; the exact/total ratio is the engine's headline quality
//! metric.

mod exact;
mod geometry;
mod kernel;
mod ring;

pub use exact::ExactReal;
pub use geometry::{Point2, Vector2};
pub use kernel::{Kernel, KernelStatistics, Orientation, OrientedSide};
pub use pdt_interval::Sign;
