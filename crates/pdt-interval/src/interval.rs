// SPDX-License-Identifier: Apache-2.0
//! The interval type and its outward-rounded algebra.

use thiserror::Error;

use crate::round::{RoundingGuard, RoundingMode};
use crate::scalar::RoundedScalar;

/// Signalled when an interval's bounds straddle zero (or overlap another
/// interval) so that no sign or ordering can be concluded.
///
/// This is a recoverable condition: the predicate filter in `pdt-kernel`
/// consumes it one frame up and falls back to exact arithmetic. It never
/// surfaces past that boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("indeterminate interval result")]
pub struct IndeterminateSign;

/// The sign of an exactly-decided quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum Sign {
    /// Strictly below zero.
    Negative = -1,
    /// Exactly zero.
    Zero = 0,
    /// Strictly above zero.
    Positive = 1,
}

impl Sign {
    /// The sign as `-1`, `0`, or `+1`.
    #[must_use]
    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

/// A closed real interval `[lo, hi]` with `lo <= hi`.
///
/// The interval brackets an unknown real value. Arithmetic (`+`, `-`, `*`)
/// preserves containment: if `x ∈ a` and `y ∈ b` then `x ⊕ y ∈ a ⊕ b`,
/// because each bound is computed under the rounding direction that can only
/// move it outward. Construction and accessors never touch the rounding mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T> {
    lo: T,
    hi: T,
}

/// Computes an operation on both bounds under one scoped rounding guard:
/// the first closure under round-downward, the second under round-upward.
///
/// `std::hint::black_box` keeps the compiler from constant-folding or
/// hoisting the float operations out of the directed-rounding window.
fn directed<T, F, G>(lower: F, upper: G) -> (T, T)
where
    F: FnOnce() -> T,
    G: FnOnce() -> T,
{
    let guard = RoundingGuard::acquire();
    guard.set(RoundingMode::Downward);
    let lo = lower();
    guard.set(RoundingMode::Upward);
    let hi = upper();
    drop(guard);
    (lo, hi)
}

fn min4<T: RoundedScalar>(a: T, b: T, c: T, d: T) -> T {
    let x = if a < b { a } else { b };
    let y = if c < d { c } else { d };
    if x < y {
        x
    } else {
        y
    }
}

fn max4<T: RoundedScalar>(a: T, b: T, c: T, d: T) -> T {
    let x = if a > b { a } else { b };
    let y = if c > d { c } else { d };
    if x > y {
        x
    } else {
        y
    }
}

impl<T: RoundedScalar> Interval<T> {
    /// The singleton interval `[x, x]`.
    #[must_use]
    pub fn new(x: T) -> Self {
        Self { lo: x, hi: x }
    }

    /// The interval spanning `a` and `b`, in either order.
    #[must_use]
    pub fn from_bounds(a: T, b: T) -> Self {
        if b < a {
            Self { lo: b, hi: a }
        } else {
            Self { lo: a, hi: b }
        }
    }

    /// The lower bound.
    #[must_use]
    pub fn lower(&self) -> T {
        self.lo
    }

    /// The upper bound.
    #[must_use]
    pub fn upper(&self) -> T {
        self.hi
    }

    /// Whether the interval pins exactly one value (`lo == hi`).
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.lo == self.hi
    }

    /// The sign of the bracketed real value, when the bounds decide it.
    ///
    /// Returns [`Sign::Negative`] when the whole interval is below zero,
    /// [`Sign::Positive`] when it is above, and [`Sign::Zero`] only for the
    /// singleton `[0, 0]`. Any other bracket straddles zero and yields
    /// [`IndeterminateSign`].
    pub fn sign(&self) -> Result<Sign, IndeterminateSign> {
        let zero = T::zero();
        if self.hi < zero {
            Ok(Sign::Negative)
        } else if self.lo > zero {
            Ok(Sign::Positive)
        } else if self.lo == zero && self.hi == zero {
            Ok(Sign::Zero)
        } else {
            T::stats().record_indeterminate();
            Err(IndeterminateSign)
        }
    }

    /// Strict ordering against another interval.
    ///
    /// `true` when every value of `self` is below every value of `other`,
    /// `false` when no value of `self` is below any value of `other`;
    /// overlapping brackets are indeterminate.
    pub fn try_lt(&self, other: &Self) -> Result<bool, IndeterminateSign> {
        if self.hi < other.lo {
            Ok(true)
        } else if self.lo >= other.hi {
            Ok(false)
        } else {
            T::stats().record_indeterminate();
            Err(IndeterminateSign)
        }
    }
}

impl<T: RoundedScalar> core::ops::Add for Interval<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        use std::hint::black_box;
        T::stats().record_op();
        let (lo, hi) = directed(
            || black_box(self.lo) + black_box(rhs.lo),
            || black_box(self.hi) + black_box(rhs.hi),
        );
        Self { lo, hi }
    }
}

impl<T: RoundedScalar> core::ops::Sub for Interval<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        use std::hint::black_box;
        T::stats().record_op();
        let (lo, hi) = directed(
            || black_box(self.lo) - black_box(rhs.hi),
            || black_box(self.hi) - black_box(rhs.lo),
        );
        Self { lo, hi }
    }
}

impl<T: RoundedScalar> core::ops::Mul for Interval<T> {
    type Output = Self;

    // All four cross-products are evaluated under each direction; which pair
    // realises the extremes depends on the operand signs, so min/max over the
    // correctly-rounded candidates is the only branch-free correct answer.
    fn mul(self, rhs: Self) -> Self {
        use std::hint::black_box;
        T::stats().record_op();
        let (lo, hi) = directed(
            || {
                min4(
                    black_box(self.lo) * black_box(rhs.lo),
                    black_box(self.lo) * black_box(rhs.hi),
                    black_box(self.hi) * black_box(rhs.lo),
                    black_box(self.hi) * black_box(rhs.hi),
                )
            },
            || {
                max4(
                    black_box(self.lo) * black_box(rhs.lo),
                    black_box(self.lo) * black_box(rhs.hi),
                    black_box(self.hi) * black_box(rhs.lo),
                    black_box(self.hi) * black_box(rhs.hi),
                )
            },
        );
        Self { lo, hi }
    }
}
