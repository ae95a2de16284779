// SPDX-License-Identifier: Apache-2.0
//! The predicate kernel: filtered exact-sign tests and their compositions.

use core::marker::PhantomData;
use core::sync::atomic::{AtomicU64, Ordering};

use num_rational::BigRational;
use pdt_interval::{IndeterminateSign, Interval, Sign};

use crate::exact::ExactReal;
use crate::geometry::{Point2, Vector2};
use crate::ring::{incircle_det, orientation_det, preferred_direction_det, SignedRing};

/// The possible outcomes of an orientation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum Orientation {
    /// `c` lies strictly to the right of the directed line `a → b`.
    RightTurn = -1,
    /// `a`, `b`, `c` lie on one line.
    Collinear = 0,
    /// `c` lies strictly to the left of the directed line `a → b`.
    LeftTurn = 1,
}

/// The possible outcomes of an oriented-side-of-circle test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum OrientedSide {
    /// Strictly outside the oriented circle.
    OnNegativeSide = -1,
    /// Exactly on the circle.
    OnBoundary = 0,
    /// Strictly inside the oriented circle.
    OnPositiveSide = 1,
}

/// A snapshot of the kernel's predicate counters.
///
/// Totals count every call; exact counts only the calls whose interval
/// filter was inconclusive. The counters are process-wide and shared across
/// scalar instantiations of [`Kernel`]; they are single-run diagnostics, not
/// a concurrency-safe metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KernelStatistics {
    /// Total orientation tests.
    pub orientation_total_count: u64,
    /// Orientation tests that fell back to exact arithmetic.
    pub orientation_exact_count: u64,
    /// Total side-of-oriented-circle tests.
    pub side_of_oriented_circle_total_count: u64,
    /// Side-of-oriented-circle tests that fell back to exact arithmetic.
    pub side_of_oriented_circle_exact_count: u64,
    /// Total preferred-direction tests.
    pub preferred_direction_total_count: u64,
    /// Preferred-direction tests that fell back to exact arithmetic.
    pub preferred_direction_exact_count: u64,
}

struct Counters {
    orientation_total: AtomicU64,
    orientation_exact: AtomicU64,
    side_total: AtomicU64,
    side_exact: AtomicU64,
    pd_total: AtomicU64,
    pd_exact: AtomicU64,
}

static COUNTERS: Counters = Counters {
    orientation_total: AtomicU64::new(0),
    orientation_exact: AtomicU64::new(0),
    side_total: AtomicU64::new(0),
    side_exact: AtomicU64::new(0),
    pd_total: AtomicU64::new(0),
    pd_exact: AtomicU64::new(0),
};

fn decisive(sign: Result<Sign, IndeterminateSign>) -> Sign {
    match sign {
        Ok(s) => s,
        Err(IndeterminateSign) => unreachable!("exact arithmetic is decisive"),
    }
}

/// Runs the filter pattern for one predicate: interval evaluation first,
/// exact re-evaluation of the identical polynomial on an indeterminate sign.
fn filtered_sign<FI, FE>(total: &AtomicU64, exact: &AtomicU64, filter: FI, fallback: FE) -> Sign
where
    FI: FnOnce() -> Result<Sign, IndeterminateSign>,
    FE: FnOnce() -> BigRational,
{
    total.fetch_add(1, Ordering::Relaxed);
    match filter() {
        Ok(s) => s,
        Err(IndeterminateSign) => {
            exact.fetch_add(1, Ordering::Relaxed);
            decisive(fallback().try_sign())
        }
    }
}

fn iv<R: ExactReal>(p: Point2<R>) -> [Interval<R>; 2] {
    [Interval::new(p.x()), Interval::new(p.y())]
}

fn iv_vec<R: ExactReal>(v: Vector2<R>) -> [Interval<R>; 2] {
    [Interval::new(v.x()), Interval::new(v.y())]
}

fn ex<R: ExactReal>(p: Point2<R>) -> [BigRational; 2] {
    [p.x().to_exact(), p.y().to_exact()]
}

fn ex_vec<R: ExactReal>(v: Vector2<R>) -> [BigRational; 2] {
    [v.x().to_exact(), v.y().to_exact()]
}

/// A geometry kernel with robust predicates over the scalar type `R`.
///
/// The kernel is stateless; construction and copies are trivial. All
/// statistics live in process-wide counters shared by every instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kernel<R> {
    _marker: PhantomData<R>,
}

impl<R: ExactReal> Kernel<R> {
    /// Creates a kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Determines how the point `c` is positioned relative to the directed
    /// line through `a` and `b`, in that order.
    ///
    /// Precondition: `a` and `b` are distinct.
    #[must_use]
    pub fn orientation(&self, a: Point2<R>, b: Point2<R>, c: Point2<R>) -> Orientation {
        debug_assert!(a != b, "orientation requires distinct a, b");
        let sign = filtered_sign(
            &COUNTERS.orientation_total,
            &COUNTERS.orientation_exact,
            || orientation_det(iv(a), iv(b), iv(c)).try_sign(),
            || orientation_det(ex(a), ex(b), ex(c)),
        );
        match sign {
            Sign::Negative => Orientation::RightTurn,
            Sign::Zero => Orientation::Collinear,
            Sign::Positive => Orientation::LeftTurn,
        }
    }

    /// Determines how the point `d` is positioned relative to the oriented
    /// circle through `a`, `b`, `c`, in that order.
    ///
    /// With `a`, `b`, `c` in CCW order, [`OrientedSide::OnPositiveSide`]
    /// means strictly inside the circle. Preconditions: `a`, `b`, `c` are
    /// not collinear and are given in CCW order (the test is
    /// orientation-sensitive).
    #[must_use]
    pub fn side_of_oriented_circle(
        &self,
        a: Point2<R>,
        b: Point2<R>,
        c: Point2<R>,
        d: Point2<R>,
    ) -> OrientedSide {
        let sign = filtered_sign(
            &COUNTERS.side_total,
            &COUNTERS.side_exact,
            || incircle_det(iv(a), iv(b), iv(c), iv(d)).try_sign(),
            || incircle_det(ex(a), ex(b), ex(c), ex(d)),
        );
        match sign {
            Sign::Negative => OrientedSide::OnNegativeSide,
            Sign::Zero => OrientedSide::OnBoundary,
            Sign::Positive => OrientedSide::OnPositiveSide,
        }
    }

    /// Compares the alignment of segment `ab` with `v` against the alignment
    /// of segment `cd` with `v`.
    ///
    /// Returns [`Sign::Positive`] when `ab` is more closely aligned with the
    /// direction of `v` than `cd` is, [`Sign::Zero`] when they are equally
    /// aligned, and [`Sign::Negative`] when less. Alignment is measured by
    /// squared normalised projection, so segment lengths and senses do not
    /// matter. Preconditions: `a ≠ b`, `c ≠ d`, `v ≠ 0`.
    #[must_use]
    pub fn preferred_direction(
        &self,
        a: Point2<R>,
        b: Point2<R>,
        c: Point2<R>,
        d: Point2<R>,
        v: Vector2<R>,
    ) -> Sign {
        debug_assert!(a != b, "preferred_direction requires distinct a, b");
        debug_assert!(c != d, "preferred_direction requires distinct c, d");
        filtered_sign(
            &COUNTERS.pd_total,
            &COUNTERS.pd_exact,
            || preferred_direction_det(iv(a), iv(b), iv(c), iv(d), iv_vec(v)).try_sign(),
            || preferred_direction_det(ex(a), ex(b), ex(c), ex(d), ex_vec(v)),
        )
    }

    /// Tests whether the quadrilateral `a b c d`, given in CCW order, is
    /// strictly convex.
    ///
    /// Precondition: the vertices are distinct and in CCW order.
    #[must_use]
    pub fn is_strictly_convex_quad(
        &self,
        a: Point2<R>,
        b: Point2<R>,
        c: Point2<R>,
        d: Point2<R>,
    ) -> bool {
        self.orientation(a, b, c) == Orientation::LeftTurn
            && self.orientation(b, c, d) == Orientation::LeftTurn
            && self.orientation(c, d, a) == Orientation::LeftTurn
            && self.orientation(d, a, b) == Orientation::LeftTurn
    }

    /// Tests whether the flippable edge with endpoints `a` and `c` and
    /// incident faces `abc` and `acd` (both CCW) is locally Delaunay.
    ///
    /// Preconditions: the points are distinct and the quadrilateral `abcd`
    /// is strictly convex.
    #[must_use]
    pub fn is_locally_delaunay_edge(
        &self,
        a: Point2<R>,
        b: Point2<R>,
        c: Point2<R>,
        d: Point2<R>,
    ) -> bool {
        self.side_of_oriented_circle(a, b, c, d) != OrientedSide::OnPositiveSide
    }

    /// Tests whether the flippable edge with endpoints `a` and `c` and
    /// incident faces `abc` and `acd` (both CCW) has the
    /// preferred-directions locally-Delaunay property for the primary
    /// direction `u` and tie-breaker `v`.
    ///
    /// The edge endpoints are the *first and third* arguments; the opposite
    /// vertices are the second and fourth. On a cocircular tie the current
    /// diagonal `a → c` is compared against the flip diagonal `b → d`: the
    /// edge survives exactly when it is more closely aligned with `u`
    /// (falling back to `v` on a second tie).
    ///
    /// Preconditions: the points are distinct; `u` and `v` are non-zero and
    /// neither parallel nor orthogonal to each other (the tie order is not
    /// total otherwise).
    #[must_use]
    pub fn is_locally_pd_delaunay_edge(
        &self,
        a: Point2<R>,
        b: Point2<R>,
        c: Point2<R>,
        d: Point2<R>,
        u: Vector2<R>,
        v: Vector2<R>,
    ) -> bool {
        match self.side_of_oriented_circle(a, b, c, d) {
            OrientedSide::OnNegativeSide => true,
            OrientedSide::OnPositiveSide => false,
            OrientedSide::OnBoundary => match self.preferred_direction(a, c, b, d, u) {
                Sign::Positive => true,
                Sign::Negative => false,
                Sign::Zero => self.preferred_direction(a, c, b, d, v) == Sign::Positive,
            },
        }
    }

    /// Reads the current values of the process-wide kernel statistics.
    #[must_use]
    pub fn statistics() -> KernelStatistics {
        KernelStatistics {
            orientation_total_count: COUNTERS.orientation_total.load(Ordering::Relaxed),
            orientation_exact_count: COUNTERS.orientation_exact.load(Ordering::Relaxed),
            side_of_oriented_circle_total_count: COUNTERS.side_total.load(Ordering::Relaxed),
            side_of_oriented_circle_exact_count: COUNTERS.side_exact.load(Ordering::Relaxed),
            preferred_direction_total_count: COUNTERS.pd_total.load(Ordering::Relaxed),
            preferred_direction_exact_count: COUNTERS.pd_exact.load(Ordering::Relaxed),
        }
    }

    /// Clears (zeroes) all process-wide kernel statistics.
    pub fn clear_statistics() {
        COUNTERS.orientation_total.store(0, Ordering::Relaxed);
        COUNTERS.orientation_exact.store(0, Ordering::Relaxed);
        COUNTERS.side_total.store(0, Ordering::Relaxed);
        COUNTERS.side_exact.store(0, Ordering::Relaxed);
        COUNTERS.pd_total.store(0, Ordering::Relaxed);
        COUNTERS.pd_exact.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    fn v(x: f64, y: f64) -> Vector2<f64> {
        Vector2::new(x, y)
    }

    #[test]
    fn orientation_basic_triples() {
        let k = Kernel::new();
        let a = p(0.0, 0.0);
        let b = p(2.0, 2.0);
        assert_eq!(k.orientation(a, b, p(2.0, 0.0)), Orientation::RightTurn);
        assert_eq!(k.orientation(a, b, p(1.0, 1.0)), Orientation::Collinear);
        assert_eq!(k.orientation(a, b, p(0.0, 2.0)), Orientation::LeftTurn);
    }

    #[test]
    fn orientation_narrow_scalar() {
        let k = Kernel::<f32>::new();
        let a = Point2::new(0.0_f32, 0.0);
        let b = Point2::new(2.0_f32, 2.0);
        assert_eq!(
            k.orientation(a, b, Point2::new(1.0_f32, 1.0)),
            Orientation::Collinear
        );
    }

    #[test]
    fn orientation_collinear_decimals_take_exact_path() {
        let k = Kernel::new();
        let before = Kernel::<f64>::statistics();
        // 0.1, 0.2, 0.3 are non-dyadic: the interval determinant brackets
        // zero without pinning it, so only the exact engine can answer.
        let got = k.orientation(p(0.1, 0.1), p(0.2, 0.2), p(0.3, 0.3));
        let after = Kernel::<f64>::statistics();
        assert_eq!(got, Orientation::Collinear);
        assert!(after.orientation_exact_count > before.orientation_exact_count);
        assert!(after.orientation_total_count > before.orientation_total_count);
    }

    #[test]
    fn orientation_perturbation_resolves_to_the_correct_side() {
        let k = Kernel::new();
        let a = p(0.1, 0.1);
        let b = p(0.2, 0.2);
        assert_eq!(k.orientation(a, b, p(0.3, 0.3 + 1e-13)), Orientation::LeftTurn);
        assert_eq!(k.orientation(a, b, p(0.3, 0.3 - 1e-13)), Orientation::RightTurn);
    }

    #[test]
    fn side_of_circle_inside_boundary_outside() {
        let k = Kernel::new();
        let a = p(0.0, 0.0);
        let b = p(2.0, 0.0);
        let c = p(0.0, 2.0);
        assert_eq!(
            k.side_of_oriented_circle(a, b, c, p(1.0, 1.0)),
            OrientedSide::OnPositiveSide
        );
        assert_eq!(
            k.side_of_oriented_circle(a, b, c, p(2.0, 2.0)),
            OrientedSide::OnBoundary
        );
        assert_eq!(
            k.side_of_oriented_circle(a, b, c, p(3.0, 3.0)),
            OrientedSide::OnNegativeSide
        );
    }

    #[test]
    fn cocircular_decimals_take_exact_path() {
        let k = Kernel::new();
        let before = Kernel::<f64>::statistics();
        // A square with non-dyadic coordinates: all four corners cocircular.
        let got = k.side_of_oriented_circle(p(0.1, 0.1), p(0.7, 0.1), p(0.7, 0.7), p(0.1, 0.7));
        let after = Kernel::<f64>::statistics();
        assert_eq!(got, OrientedSide::OnBoundary);
        assert!(
            after.side_of_oriented_circle_exact_count > before.side_of_oriented_circle_exact_count
        );
    }

    #[test]
    fn cocircular_perturbation_resolves_to_the_correct_side() {
        let k = Kernel::new();
        let a = p(0.1, 0.1);
        let b = p(0.7, 0.1);
        let c = p(0.7, 0.7);
        // Nudging the fourth corner inward/outward leaves the boundary.
        assert_eq!(
            k.side_of_oriented_circle(a, b, c, p(0.1 + 1e-12, 0.7)),
            OrientedSide::OnPositiveSide
        );
        assert_eq!(
            k.side_of_oriented_circle(a, b, c, p(0.1 - 1e-12, 0.7)),
            OrientedSide::OnNegativeSide
        );
    }

    #[test]
    fn preferred_direction_reference_vectors() {
        let k = Kernel::new();
        let a = p(0.0, 0.0);
        let b = p(2.0, 2.0);
        let c = p(2.0, 0.0);
        let d = p(0.0, 2.0);
        assert_eq!(k.preferred_direction(a, b, c, d, v(2.0, 1.0)), Sign::Positive);
        assert_eq!(k.preferred_direction(a, b, c, d, v(1.0, 0.0)), Sign::Zero);
        assert_eq!(k.preferred_direction(a, b, c, d, v(-1.0, 2.0)), Sign::Negative);
    }

    #[test]
    fn preferred_direction_is_sense_independent() {
        let k = Kernel::new();
        let a = p(0.0, 0.0);
        let b = p(2.0, 2.0);
        let c = p(2.0, 0.0);
        let d = p(0.0, 2.0);
        let u = v(2.0, 1.0);
        // Reversing either segment cannot change a squared projection.
        assert_eq!(k.preferred_direction(b, a, c, d, u), Sign::Positive);
        assert_eq!(k.preferred_direction(a, b, d, c, u), Sign::Positive);
    }

    #[test]
    fn strictly_convex_quad_cases() {
        let k = Kernel::new();
        assert!(k.is_strictly_convex_quad(p(0.0, 2.0), p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0)));
        // Collinear run.
        assert!(!k.is_strictly_convex_quad(p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0)));
        // Reflex at the third vertex.
        assert!(!k.is_strictly_convex_quad(p(0.0, 2.0), p(0.0, 0.0), p(1.0, 1.0), p(3.0, 0.0)));
    }

    #[test]
    fn locally_delaunay_edge_cases() {
        let k = Kernel::new();
        let a = p(0.0, 0.0);
        let b = p(2.0, 0.0);
        let c = p(0.0, 2.0);
        assert!(!k.is_locally_delaunay_edge(a, b, c, p(1.0, 1.0)));
        assert!(k.is_locally_delaunay_edge(a, b, c, p(2.0, 2.0)));
        assert!(k.is_locally_delaunay_edge(a, b, c, p(3.0, 3.0)));
    }

    #[test]
    fn locally_pd_delaunay_edge_cases() {
        let k = Kernel::new();
        let u = v(1.0, 1.5);
        let w = v(1.0, 0.0);
        // Opposite vertex strictly inside: never PD-Delaunay.
        assert!(!k.is_locally_pd_delaunay_edge(
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(0.0, 2.0),
            p(1.0, 1.0),
            u,
            w
        ));
        // Cocircular: diagonal c→b loses to diagonal a→e under u = (1, 1.5).
        assert!(!k.is_locally_pd_delaunay_edge(
            p(0.0, 2.0),
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 2.0),
            u,
            w
        ));
        // Opposite vertex strictly outside: always PD-Delaunay.
        assert!(k.is_locally_pd_delaunay_edge(
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(0.0, 2.0),
            p(3.0, 3.0),
            u,
            w
        ));
    }

    #[test]
    fn pd_tie_breaks_on_square_diagonals() {
        let k = Kernel::new();
        let a = p(0.0, 0.0);
        let b = p(2.0, 0.0);
        let c = p(2.0, 2.0);
        let d = p(0.0, 2.0);
        // u ties the two diagonals; v = (1, 1) prefers the current one.
        assert!(k.is_locally_pd_delaunay_edge(a, b, c, d, v(1.0, 0.0), v(1.0, 1.0)));
        // v = (1, -1) prefers the flip diagonal instead.
        assert!(!k.is_locally_pd_delaunay_edge(a, b, c, d, v(1.0, 0.0), v(1.0, -1.0)));
    }

    #[test]
    fn exact_counts_never_exceed_totals() {
        let k = Kernel::new();
        let _ = k.orientation(p(0.1, 0.1), p(0.2, 0.2), p(0.3, 0.3));
        let _ = k.side_of_oriented_circle(p(0.0, 0.0), p(2.0, 0.0), p(0.0, 2.0), p(1.0, 1.0));
        let _ = k.preferred_direction(p(0.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(1.0, 0.0), v(1.0, 3.0));
        let s = Kernel::<f64>::statistics();
        assert!(s.orientation_exact_count <= s.orientation_total_count);
        assert!(s.side_of_oriented_circle_exact_count <= s.side_of_oriented_circle_total_count);
        assert!(s.preferred_direction_exact_count <= s.preferred_direction_total_count);
    }

    #[test]
    fn statistics_totals_advance_per_call() {
        let k = Kernel::new();
        let before = Kernel::<f64>::statistics();
        let _ = k.orientation(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0));
        let after = Kernel::<f64>::statistics();
        assert!(after.orientation_total_count > before.orientation_total_count);
    }

    #[test]
    fn easy_inputs_do_not_trip_the_filter() {
        let k = Kernel::new();
        let before = Kernel::<f64>::statistics();
        // Small-integer coordinates evaluate exactly in the interval filter,
        // so none of these calls may reach the exact engine. The counters are
        // process-wide, so other test threads can add their own increments;
        // 100 filter-clean calls against their handful keeps the comparison
        // decisive.
        for _ in 0..100 {
            let _ = k.orientation(p(0.0, 0.0), p(2.0, 2.0), p(2.0, 0.0));
        }
        let after = Kernel::<f64>::statistics();
        let exact_delta = after.orientation_exact_count - before.orientation_exact_count;
        let total_delta = after.orientation_total_count - before.orientation_total_count;
        assert!(exact_delta < 100);
        assert!(total_delta >= 100);
    }

    #[test]
    fn identical_inputs_are_deterministic() {
        let k = Kernel::new();
        let a = p(0.1, 0.7);
        let b = p(0.9, 0.2);
        let c = p(0.4, 0.8);
        let d = p(0.6, 0.6);
        let first = k.side_of_oriented_circle(a, b, c, d);
        for _ in 0..10 {
            assert_eq!(k.side_of_oriented_circle(a, b, c, d), first);
        }
    }

    #[test]
    fn clear_statistics_is_observable() {
        let k = Kernel::new();
        let _ = k.orientation(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0));
        Kernel::<f64>::clear_statistics();
        let s1 = Kernel::<f64>::statistics();
        let _ = k.orientation(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0));
        let s2 = Kernel::<f64>::statistics();
        assert!(s2.orientation_total_count > s1.orientation_total_count);
    }
}
