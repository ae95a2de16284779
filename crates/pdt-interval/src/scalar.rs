// SPDX-License-Identifier: Apache-2.0
//! Scalar abstraction over the IEEE-754 types an interval can be built from.
//!
//! The interval algebra is written once against [`RoundedScalar`] and bound
//! to `f32` or `f64` (the kernel downstream picks the instantiation). The
//! trait carries only what directed rounding needs: the arithmetic operator
//! traits, ordering, a zero, boundary conversions for I/O, and a hook to the
//! per-type statistics cells.

use core::fmt;
use core::ops::{Add, Mul, Sub};
use core::sync::atomic::{AtomicU64, Ordering};

/// Process-wide interval statistics cells for one scalar type.
///
/// The counters are single-run diagnostics: increments are relaxed atomics
/// with no cross-thread ordering guarantee.
#[derive(Debug)]
pub struct IntervalStats {
    arithmetic_ops: AtomicU64,
    indeterminate_results: AtomicU64,
}

impl IntervalStats {
    const fn new() -> Self {
        Self {
            arithmetic_ops: AtomicU64::new(0),
            indeterminate_results: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_op(&self) {
        self.arithmetic_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_indeterminate(&self) {
        self.indeterminate_results.fetch_add(1, Ordering::Relaxed);
    }

    /// The total number of interval arithmetic operations performed.
    #[must_use]
    pub fn arithmetic_op_count(&self) -> u64 {
        self.arithmetic_ops.load(Ordering::Relaxed)
    }

    /// The total number of indeterminate results encountered.
    #[must_use]
    pub fn indeterminate_result_count(&self) -> u64 {
        self.indeterminate_results.load(Ordering::Relaxed)
    }

    /// Resets both counters to zero.
    pub fn clear(&self) {
        self.arithmetic_ops.store(0, Ordering::Relaxed);
        self.indeterminate_results.store(0, Ordering::Relaxed);
    }
}

/// An IEEE-754 scalar usable as an interval bound.
///
/// Implementations must be actual hardware floating-point types: the interval
/// algebra computes their sums, differences, and products under a directed
/// rounding mode and relies on the FPU honouring that mode.
pub trait RoundedScalar:
    Copy
    + fmt::Debug
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Returns the additive identity.
    fn zero() -> Self;

    /// Converts from `f64` at a boundary crossing (e.g. parsed input).
    ///
    /// Narrowing conversions round to nearest; the interval algebra never
    /// calls this internally.
    fn from_f64(value: f64) -> Self;

    /// Converts to `f64` for interop and serialization.
    fn to_f64(self) -> f64;

    /// The process-wide statistics cells for this scalar type.
    fn stats() -> &'static IntervalStats;
}

static F32_STATS: IntervalStats = IntervalStats::new();
static F64_STATS: IntervalStats = IntervalStats::new();

impl RoundedScalar for f32 {
    fn zero() -> Self {
        0.0
    }

    fn from_f64(value: f64) -> Self {
        // Narrowing rounds to nearest, as any boundary crossing into f32 must.
        #[allow(clippy::cast_possible_truncation)]
        let narrowed = value as Self;
        narrowed
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn stats() -> &'static IntervalStats {
        &F32_STATS
    }
}

impl RoundedScalar for f64 {
    fn zero() -> Self {
        0.0
    }

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn stats() -> &'static IntervalStats {
        &F64_STATS
    }
}
