// SPDX-License-Identifier: Apache-2.0
//! Exact conversion from IEEE scalars to arbitrary-precision rationals.

use num_rational::BigRational;
use pdt_interval::RoundedScalar;

/// A scalar whose every finite value converts *exactly* into a rational.
///
/// Finite IEEE-754 values are dyadic rationals, so the conversion is lossless
/// by construction; it is what lets the exact fallback evaluate the same
/// determinant the interval filter saw, over the same inputs, with a total
/// sign function.
pub trait ExactReal: RoundedScalar {
    /// The exact rational value of this scalar.
    ///
    /// Callers must uphold finiteness; a NaN or infinity here means an input
    /// validation layer upstream failed, which is a programming error.
    fn to_exact(self) -> BigRational;
}

impl ExactReal for f32 {
    fn to_exact(self) -> BigRational {
        BigRational::from_float(self)
            .unwrap_or_else(|| unreachable!("finite scalar required for exact conversion"))
    }
}

impl ExactReal for f64 {
    fn to_exact(self) -> BigRational {
        BigRational::from_float(self)
            .unwrap_or_else(|| unreachable!("finite scalar required for exact conversion"))
    }
}
