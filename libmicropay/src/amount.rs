//! Token arithmetic.
//!
//! [`fail_safe_add`] and [`fail_safe_sub`] are the only two operations that never fail. Everything else
//! goes through the checked helpers, which report overflow and underflow as [`MicropayError::Math`].

use crate::error::MicropayError;

/// Saturating addition with `u64::MAX` as the ceiling.
pub fn fail_safe_add(a: u64, b: u64) -> u64 {
    a.saturating_add(b)
}

/// Subtracts as much of `b` from `a` as possible. Returns `(a - b, b)` when `a >= b`, otherwise `(0, a)`.
/// The two results always add up to `a`.
pub fn fail_safe_sub(a: u64, b: u64) -> (u64, u64) {
    if a >= b {
        (a - b, b)
    } else {
        (0, a)
    }
}

pub fn checked_add(a: u64, b: u64, what: &str) -> Result<u64, MicropayError> {
    a.checked_add(b).ok_or_else(|| MicropayError::math(format!("{what} overflows ({a} + {b})")))
}

pub fn checked_sub(a: u64, b: u64, what: &str) -> Result<u64, MicropayError> {
    a.checked_sub(b).ok_or_else(|| MicropayError::math(format!("{what} underflows ({a} - {b})")))
}

/// Checked subtraction that also requires a strictly positive result.
pub fn positive_sub(a: u64, b: u64, what: &str) -> Result<u64, MicropayError> {
    match checked_sub(a, b, what)? {
        0 => Err(MicropayError::math(format!("{what} must be greater than zero"))),
        v => Ok(v),
    }
}
