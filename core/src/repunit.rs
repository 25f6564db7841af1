//! Closed-form classification for roots made only of the digit `1`.
//!
//! The self-convolution of `n` ones is the triangle `1, 2, ..., n, ..., 2, 1`,
//! so the peak is exactly `n`. While `n < b` no coefficient carries and the
//! square reads the same in both directions; from `n = b` on it does not.
//! Base 2 is a fixed exception: lengths 1 and 2 are palindromic, 3+ are not.

use num_bigint::BigUint;

use repsq_types::{Base, ComputePath, ComputeResult, RawCoefficients};

use crate::carry::{self, TraceRequest};

/// True when every digit is `1` (and there is at least one).
#[must_use]
pub fn is_repunit(digits: &[u8]) -> bool {
    !digits.is_empty() && digits.iter().all(|&d| d == 1)
}

/// Verdict and peak of a repunit square, without materializing any digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepunitClassification {
    pub base: Base,
    pub length: usize,
    pub is_palindrome: bool,
    pub peak: BigUint,
}

/// Classify the square of the `length`-digit repunit in `base`. O(1).
#[must_use]
pub fn classify_repunit(base: Base, length: usize) -> RepunitClassification {
    let is_palindrome = if base == Base::BINARY {
        length <= 2
    } else {
        length <= usize::from(base.max_digit())
    };
    RepunitClassification {
        base,
        length,
        is_palindrome,
        peak: BigUint::from(length),
    }
}

/// Closed-form raw coefficients: `c[k] = min(k + 1, 2n - 1 - k)`.
#[must_use]
pub fn repunit_coefficients(length: usize) -> RawCoefficients {
    if length == 0 {
        return RawCoefficients::new(vec![BigUint::from(0u32)]);
    }
    let span = 2 * length - 1;
    RawCoefficients::new(
        (0..span)
            .map(|k| BigUint::from((k + 1).min(span - k)))
            .collect(),
    )
}

/// Classify and materialize the full square in O(n) plus the carry pass.
#[must_use]
pub fn square_repunit(base: Base, length: usize, trace: TraceRequest) -> ComputeResult {
    let classification = classify_repunit(base, length);
    let raw = repunit_coefficients(length);
    let normalized = carry::normalize(raw.as_slice(), base, trace);
    ComputeResult::exact(
        normalized.digits,
        raw,
        classification.peak,
        classification.is_palindrome,
        normalized.trace,
        ComputePath::Repunit,
    )
}
