// SPDX-License-Identifier: Apache-2.0
//! Scoped control of the hardware floating-point rounding mode.
//!
//! The rounding mode lives in the FPU control word, which is shared by the
//! whole process. Directed-rounding interval arithmetic therefore treats it
//! as a scoped resource: a [`RoundingGuard`] captures the ambient mode on
//! acquisition and restores it when dropped, on every exit path. A restore
//! that fails leaves the process computing under the wrong mode, which would
//! silently invalidate every containment guarantee downstream; that failure
//! aborts the process rather than propagating.

use std::process::abort;

// The `libc` crate does not bind the C99 `<fenv.h>` rounding-mode API, so the
// functions and control-word constants are declared directly here. The
// constants below are glibc's values, which are the same across its
// supported architectures (the rounding-mode bits of the x87/SSE and VFP
// control words happen to line up with this encoding).
#[allow(unsafe_code)]
extern "C" {
    fn fegetround() -> libc::c_int;
    fn fesetround(round: libc::c_int) -> libc::c_int;
}

#[cfg(target_arch = "aarch64")]
const FE_TONEAREST: libc::c_int = 0x0000_0000;
#[cfg(target_arch = "aarch64")]
const FE_UPWARD: libc::c_int = 0x0040_0000;
#[cfg(target_arch = "aarch64")]
const FE_DOWNWARD: libc::c_int = 0x0080_0000;
#[cfg(target_arch = "aarch64")]
const FE_TOWARDZERO: libc::c_int = 0x00c0_0000;

#[cfg(not(target_arch = "aarch64"))]
const FE_TONEAREST: libc::c_int = 0x0000;
#[cfg(not(target_arch = "aarch64"))]
const FE_DOWNWARD: libc::c_int = 0x0400;
#[cfg(not(target_arch = "aarch64"))]
const FE_UPWARD: libc::c_int = 0x0800;
#[cfg(not(target_arch = "aarch64"))]
const FE_TOWARDZERO: libc::c_int = 0x0c00;

/// IEEE-754 rounding directions expressible in the FPU control word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RoundingMode {
    /// Round toward negative infinity (lower-bound computations).
    Downward,
    /// Round toward positive infinity (upper-bound computations).
    Upward,
    /// Round to nearest, ties to even (the IEEE default).
    ToNearest,
    /// Round toward zero (truncation).
    TowardZero,
}

impl RoundingMode {
    fn as_raw(self) -> libc::c_int {
        match self {
            Self::Downward => FE_DOWNWARD,
            Self::Upward => FE_UPWARD,
            Self::ToNearest => FE_TONEAREST,
            Self::TowardZero => FE_TOWARDZERO,
        }
    }
}

/// Returns the raw value of the ambient rounding mode.
///
/// Exposed so tests can assert that a sequence of interval operations left
/// the control word exactly as it found it. The value is the platform's
/// `FE_*` constant and is only meaningful for equality comparison.
#[must_use]
pub fn ambient_rounding_mode() -> i32 {
    // fegetround has no failure mode; it reads the control word.
    unsafe { fegetround() }
}

/// Scoped acquisition of the rounding-mode control word.
///
/// Acquire once per arithmetic operation, switch direction with
/// [`RoundingGuard::set`] as the lower and upper bounds are computed, and let
/// `Drop` restore the captured ambient mode. The guard is deliberately not
/// `Clone`: one live guard means one owner of the control word.
#[derive(Debug)]
pub struct RoundingGuard {
    saved: libc::c_int,
}

impl RoundingGuard {
    /// Captures the ambient rounding mode without changing it.
    #[must_use]
    pub fn acquire() -> Self {
        Self {
            saved: unsafe { fegetround() },
        }
    }

    /// Switches the control word to `mode`.
    ///
    /// Aborts the process if the FPU rejects the mode: continuing would
    /// compute bounds under an unknown direction.
    pub fn set(&self, mode: RoundingMode) {
        if unsafe { fesetround(mode.as_raw()) } != 0 {
            abort();
        }
    }
}

impl Drop for RoundingGuard {
    fn drop(&mut self) {
        if unsafe { fesetround(self.saved) } != 0 {
            abort();
        }
    }
}
