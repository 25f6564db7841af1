//! Bounded-cost, declared-inexact estimate of a square.
//!
//! Only a dense window around the convolution midpoint and a strided sample
//! across the full range are computed exactly. Every other coefficient is
//! taken as zero, so the normalized digits are an approximation and the
//! verdict is always indeterminate. Cost is O((window + samples) * m).

use num_bigint::BigUint;
use num_traits::Zero;

use repsq_types::{CarryTrace, ComputeResult, DigitSequence, RawCoefficients};

use crate::carry::{self, TraceRequest};
use crate::convolution::coefficient_at;

pub const MAX_WINDOW: usize = 50;
pub const MAX_SAMPLES: usize = 200;

/// Caps on the exact work a preview may do. Values are clamped to
/// `1..=MAX_WINDOW` and `1..=MAX_SAMPLES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewLimits {
    window: usize,
    samples: usize,
}

impl PreviewLimits {
    #[must_use]
    pub fn new(window: usize, samples: usize) -> Self {
        Self {
            window: window.clamp(1, MAX_WINDOW),
            samples: samples.clamp(1, MAX_SAMPLES),
        }
    }

    #[must_use]
    pub const fn window(self) -> usize {
        self.window
    }

    #[must_use]
    pub const fn samples(self) -> usize {
        self.samples
    }
}

impl Default for PreviewLimits {
    fn default() -> Self {
        Self::new(MAX_WINDOW, MAX_SAMPLES)
    }
}

/// Positions computed exactly: the midpoint window, then the strided samples.
#[must_use]
pub fn sampled_positions(digit_count: usize, limits: PreviewLimits) -> Vec<usize> {
    if digit_count == 0 {
        return Vec::new();
    }
    let span = 2 * digit_count - 1;
    let center = digit_count - 1;
    let window = limits.window.min(span);
    let start = center.saturating_sub(window / 2).min(span - window);

    let mut positions: Vec<usize> = (start..start + window).collect();
    let stride = span.div_ceil(limits.samples).max(1);
    positions.extend(
        (0..span)
            .step_by(stride)
            .filter(|k| !(start..start + window).contains(k)),
    );
    positions
}

/// Estimate the square of `root` within `limits`.
///
/// A requested trace is reported as omitted, since a trace over guessed
/// coefficients would explain nothing.
#[must_use]
pub fn preview_square(root: &DigitSequence, limits: PreviewLimits, trace: TraceRequest) -> ComputeResult {
    let digits = root.as_le();
    let span = 2 * digits.len() - 1;
    let mut coefficients = vec![BigUint::zero(); span];
    let mut peak = BigUint::zero();

    for k in sampled_positions(digits.len(), limits) {
        let value = coefficient_at(digits, k);
        if value > peak {
            peak.clone_from(&value);
        }
        coefficients[k] = value;
    }

    let normalized = carry::normalize(&coefficients, root.base(), TraceRequest::Skip);
    let carry_trace = match trace {
        TraceRequest::Skip => CarryTrace::NotRequested,
        TraceRequest::Collect { .. } => CarryTrace::Omitted {
            reason: "carry trace is not collected for approximate results".to_string(),
        },
    };
    ComputeResult::preview(
        normalized.digits,
        RawCoefficients::new(coefficients),
        peak,
        carry_trace,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::convolution::{NeverInterrupt, self_convolve};
    use repsq_types::{Base, ComputeMode, PalindromeVerdict};

    #[test]
    fn limits_are_clamped() {
        let limits = PreviewLimits::new(500, 0);
        assert_eq!(limits.window(), MAX_WINDOW);
        assert_eq!(limits.samples(), 1);
    }

    #[test]
    fn positions_are_bounded_and_unique() {
        let limits = PreviewLimits::default();
        let positions = sampled_positions(10_000, limits);
        assert!(positions.len() <= MAX_WINDOW + MAX_SAMPLES);
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), positions.len());
        assert!(positions.iter().all(|&k| k < 19_999));
        assert!(positions.contains(&9_999), "window covers the midpoint");
    }

    #[test]
    fn small_inputs_are_fully_covered() {
        let positions = sampled_positions(3, PreviewLimits::default());
        let mut sorted = positions;
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn preview_is_indeterminate_and_approximate() {
        let root = decode("123456789", Base::DECIMAL).unwrap();
        let result = preview_square(&root, PreviewLimits::default(), TraceRequest::Skip);
        assert_eq!(result.palindrome_verdict(), PalindromeVerdict::Indeterminate);
        assert!(result.is_approximate());
        assert_eq!(result.mode(), ComputeMode::Preview);
    }

    #[test]
    fn sampled_coefficients_are_exact() {
        let text: String = (0..400).map(|i| char::from(b'1' + (i % 9) as u8)).collect();
        let root = decode(&text, Base::DECIMAL).unwrap();
        let exact = self_convolve(root.as_le(), &NeverInterrupt).unwrap();
        let limits = PreviewLimits::new(20, 30);
        let result = preview_square(&root, limits, TraceRequest::Skip);
        let sampled = sampled_positions(root.digit_count(), limits);
        for (k, value) in result.raw_coefficients().as_slice().iter().enumerate() {
            if sampled.contains(&k) {
                assert_eq!(value, &exact.as_slice()[k]);
            } else {
                assert!(value.is_zero());
            }
        }
        assert!(result.peak() <= &exact.peak());
    }

    #[test]
    fn peak_estimate_hits_midpoint_for_uniform_digits() {
        let root = decode(&"7".repeat(1000), Base::DECIMAL).unwrap();
        let result = preview_square(&root, PreviewLimits::default(), TraceRequest::Skip);
        assert_eq!(result.peak(), &BigUint::from(49u32 * 1000));
    }

    #[test]
    fn requested_trace_is_declared_omitted() {
        let root = decode("12", Base::DECIMAL).unwrap();
        let result = preview_square(
            &root,
            PreviewLimits::default(),
            TraceRequest::Collect { max_bytes: usize::MAX },
        );
        assert!(result.carry_trace().is_omitted());
    }
}
