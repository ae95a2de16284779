// SPDX-License-Identifier: Apache-2.0
//! The capability set the predicate polynomials are written against, and the
//! polynomials themselves.
//!
//! Each determinant is expressed once, generically, over [`SignedRing`] and
//! instantiated twice: by `Interval<R>` (fast, fallible sign) and by
//! `BigRational` (slow, total sign). Static dispatch keeps the interval
//! instantiation free of indirection on the hot path.

use core::ops::{Add, Mul, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use pdt_interval::{IndeterminateSign, Interval, RoundedScalar, Sign};

/// Arithmetic capabilities a number engine must supply to evaluate the
/// predicate determinants: ring operations plus a (possibly fallible) sign.
pub(crate) trait SignedRing:
    Clone + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> + Sized
{
    /// The sign of the value, or [`IndeterminateSign`] when the engine
    /// cannot decide it.
    fn try_sign(&self) -> Result<Sign, IndeterminateSign>;
}

impl<T: RoundedScalar> SignedRing for Interval<T> {
    fn try_sign(&self) -> Result<Sign, IndeterminateSign> {
        self.sign()
    }
}

impl SignedRing for BigRational {
    fn try_sign(&self) -> Result<Sign, IndeterminateSign> {
        let zero: BigRational = BigRational::from_integer(BigInt::zero());
        Ok(match self.cmp(&zero) {
            core::cmp::Ordering::Less => Sign::Negative,
            core::cmp::Ordering::Equal => Sign::Zero,
            core::cmp::Ordering::Greater => Sign::Positive,
        })
    }
}

/// Orientation determinant: `(a - c) × (b - c)`, expanded as
/// `(ax - cx)(by - cy) - (bx - cx)(ay - cy)`.
///
/// Positive for a left turn at `c` relative to the directed line `a → b`.
#[allow(clippy::similar_names)]
pub(crate) fn orientation_det<S: SignedRing>(a: [S; 2], b: [S; 2], c: [S; 2]) -> S {
    let [ax, ay] = a;
    let [bx, by] = b;
    let [cx, cy] = c;
    (ax - cx.clone()) * (by - cy.clone()) - (bx - cx) * (ay - cy)
}

/// In-circle determinant for the oriented circle through `a`, `b`, `c`.
///
/// Each point is lifted to the paraboloid `(x, y, x² + y²)`; subtracting the
/// `d` row reduces the 4×4 lifted determinant to this 3×3. The lift terms use
/// the factored form `(px - dx)(px + dx) + (py - dy)(py + dy)`, which keeps
/// intermediate interval widths tighter than squaring first. Positive when
/// `d` lies strictly inside the circle, provided `a, b, c` are in CCW order.
#[allow(clippy::many_single_char_names)]
pub(crate) fn incircle_det<S: SignedRing>(a: [S; 2], b: [S; 2], c: [S; 2], d: [S; 2]) -> S {
    let [ax, ay] = a;
    let [bx, by] = b;
    let [cx, cy] = c;
    let [dx, dy] = d;

    let adx = ax.clone() - dx.clone();
    let ady = ay.clone() - dy.clone();
    let bdx = bx.clone() - dx.clone();
    let bdy = by.clone() - dy.clone();
    let cdx = cx.clone() - dx.clone();
    let cdy = cy.clone() - dy.clone();

    let alift = adx.clone() * (ax + dx.clone()) + ady.clone() * (ay + dy.clone());
    let blift = bdx.clone() * (bx + dx.clone()) + bdy.clone() * (by + dy.clone());
    let clift = cdx.clone() * (cx + dx) + cdy.clone() * (cy + dy);

    adx * (bdy.clone() * clift.clone() - cdy.clone() * blift.clone())
        - ady * (bdx.clone() * clift - cdx.clone() * blift)
        + alift * (bdx * cdy - cdx * bdy)
}

/// Preferred-direction determinant.
///
/// With `β = b - a` and `δ = d - c`, evaluates
/// `|δ|²(β·v)² - |β|²(δ·v)²`: positive when segment `ab` is more closely
/// aligned with `v` than segment `cd`, negative when less, zero when equal.
/// Squared projections make the comparison independent of segment length and
/// of the sense of either segment.
pub(crate) fn preferred_direction_det<S: SignedRing>(
    a: [S; 2],
    b: [S; 2],
    c: [S; 2],
    d: [S; 2],
    v: [S; 2],
) -> S {
    let [ax, ay] = a;
    let [bx, by] = b;
    let [cx, cy] = c;
    let [dx, dy] = d;
    let [vx, vy] = v;

    let beta_x = bx - ax;
    let beta_y = by - ay;
    let delta_x = dx - cx;
    let delta_y = dy - cy;

    let beta_sq = beta_x.clone() * beta_x.clone() + beta_y.clone() * beta_y.clone();
    let delta_sq = delta_x.clone() * delta_x.clone() + delta_y.clone() * delta_y.clone();
    let beta_v = beta_x * vx.clone() + beta_y * vy.clone();
    let delta_v = delta_x * vx + delta_y * vy;

    delta_sq * (beta_v.clone() * beta_v) - beta_sq * (delta_v.clone() * delta_v)
}
