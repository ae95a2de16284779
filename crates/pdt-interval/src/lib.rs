// SPDX-License-Identifier: Apache-2.0
//! Rounding-directed real interval arithmetic.
//!
//! An [`Interval`] brackets an unknown real value between two hardware
//! floating-point bounds. Every arithmetic operation widens the bracket
//! *outward* by computing the lower bound under round-toward-negative-infinity
//! and the upper bound under round-toward-positive-infinity, so containment of
//! the true real result is an invariant, not an approximation. When an
//! interval's bounds strictly exclude zero, the sign of the interval is
//! provably the sign of the real value it brackets, which is the property
//! the predicate filter in `pdt-kernel` is built on.
//!
//! The hardware rounding mode is process-global state; see [`RoundingGuard`]
//! for the scoped acquisition discipline.

// FPU control-word access goes through libc's fegetround/fesetround.
#[allow(unsafe_code)]
mod round;

mod interval;
mod scalar;

pub use interval::{IndeterminateSign, Interval, Sign};
pub use round::{ambient_rounding_mode, RoundingGuard, RoundingMode};
pub use scalar::{IntervalStats, RoundedScalar};
