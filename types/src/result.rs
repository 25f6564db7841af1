//! Computation outputs: raw coefficients, carry trace, and the finished result.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::{ComputeMode, DigitSequence, PalindromeVerdict};

/// Pre-carry squaring coefficients, index `k` holds `sum(d[i] * d[k - i])`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawCoefficients(#[serde(with = "crate::decimal::seq")] Vec<BigUint>);

impl RawCoefficients {
    #[must_use]
    pub fn new(values: Vec<BigUint>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[BigUint] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest coefficient, or zero for an empty set.
    #[must_use]
    pub fn peak(&self) -> BigUint {
        self.0.iter().max().cloned().unwrap_or_else(BigUint::zero)
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<BigUint> {
        self.0
    }
}

/// One step of carry propagation.
///
/// `digit_out = (raw + carry_in) mod base` and
/// `carry_out = (raw + carry_in) div base`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarryTraceEntry {
    pub position: usize,
    #[serde(with = "crate::decimal")]
    pub raw_coefficient: BigUint,
    #[serde(with = "crate::decimal")]
    pub incoming_carry: BigUint,
    pub digit_out: u8,
    #[serde(with = "crate::decimal")]
    pub outgoing_carry: BigUint,
}

/// Carry trace materialization outcome.
///
/// Omission is a declared degradation, never a failure: the digits it would
/// have explained are still exact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CarryTrace {
    #[default]
    NotRequested,
    Collected { entries: Vec<CarryTraceEntry> },
    Omitted { reason: String },
}

impl CarryTrace {
    #[must_use]
    pub fn entries(&self) -> Option<&[CarryTraceEntry]> {
        match self {
            CarryTrace::Collected { entries } => Some(entries),
            CarryTrace::NotRequested | CarryTrace::Omitted { .. } => None,
        }
    }

    #[must_use]
    pub fn omission_reason(&self) -> Option<&str> {
        match self {
            CarryTrace::Omitted { reason } => Some(reason),
            CarryTrace::NotRequested | CarryTrace::Collected { .. } => None,
        }
    }

    #[must_use]
    pub fn is_omitted(&self) -> bool {
        matches!(self, CarryTrace::Omitted { .. })
    }
}

/// Which algorithm produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputePath {
    Repunit,
    Convolution,
    Preview,
}

/// Wall-clock spent per stage, in microseconds. Never part of the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub coefficients_us: u64,
    pub carry_us: u64,
    pub total_us: u64,
}

/// A finished computation.
///
/// Constructed only through [`ComputeResult::exact`] or
/// [`ComputeResult::preview`]: exact results always hold a definite verdict,
/// preview results are always approximate and indeterminate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawComputeResult")]
pub struct ComputeResult {
    normalized_digits: DigitSequence,
    raw_coefficients: RawCoefficients,
    #[serde(with = "crate::decimal")]
    peak: BigUint,
    palindrome_verdict: PalindromeVerdict,
    is_approximate: bool,
    carry_trace: CarryTrace,
    mode: ComputeMode,
    path: ComputePath,
    timing: Timing,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComputeResult {
    normalized_digits: DigitSequence,
    raw_coefficients: RawCoefficients,
    #[serde(with = "crate::decimal")]
    peak: BigUint,
    palindrome_verdict: PalindromeVerdict,
    is_approximate: bool,
    carry_trace: CarryTrace,
    mode: ComputeMode,
    path: ComputePath,
    timing: Timing,
}

#[derive(Debug, thiserror::Error)]
#[error("result verdict {verdict:?} is inconsistent with mode {mode:?} (approximate: {approximate})")]
pub struct InconsistentResult {
    verdict: PalindromeVerdict,
    mode: ComputeMode,
    approximate: bool,
}

impl TryFrom<RawComputeResult> for ComputeResult {
    type Error = InconsistentResult;

    fn try_from(raw: RawComputeResult) -> Result<Self, Self::Error> {
        let consistent = match raw.mode {
            ComputeMode::Exact => !raw.is_approximate && raw.palindrome_verdict.is_definite(),
            ComputeMode::Preview => {
                raw.is_approximate && raw.palindrome_verdict == PalindromeVerdict::Indeterminate
            }
        };
        if !consistent {
            return Err(InconsistentResult {
                verdict: raw.palindrome_verdict,
                mode: raw.mode,
                approximate: raw.is_approximate,
            });
        }
        Ok(Self {
            normalized_digits: raw.normalized_digits,
            raw_coefficients: raw.raw_coefficients,
            peak: raw.peak,
            palindrome_verdict: raw.palindrome_verdict,
            is_approximate: raw.is_approximate,
            carry_trace: raw.carry_trace,
            mode: raw.mode,
            path: raw.path,
            timing: raw.timing,
        })
    }
}

impl ComputeResult {
    /// An exact result. `path` is either `Repunit` or `Convolution`.
    #[must_use]
    pub fn exact(
        normalized_digits: DigitSequence,
        raw_coefficients: RawCoefficients,
        peak: BigUint,
        is_palindrome: bool,
        carry_trace: CarryTrace,
        path: ComputePath,
    ) -> Self {
        Self {
            normalized_digits,
            raw_coefficients,
            peak,
            palindrome_verdict: PalindromeVerdict::from_bool(is_palindrome),
            is_approximate: false,
            carry_trace,
            mode: ComputeMode::Exact,
            path,
            timing: Timing::default(),
        }
    }

    /// A declared-inexact estimate. The verdict is always indeterminate.
    #[must_use]
    pub fn preview(
        normalized_digits: DigitSequence,
        raw_coefficients: RawCoefficients,
        estimated_peak: BigUint,
        carry_trace: CarryTrace,
    ) -> Self {
        Self {
            normalized_digits,
            raw_coefficients,
            peak: estimated_peak,
            palindrome_verdict: PalindromeVerdict::Indeterminate,
            is_approximate: true,
            carry_trace,
            mode: ComputeMode::Preview,
            path: ComputePath::Preview,
            timing: Timing::default(),
        }
    }

    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn normalized_digits(&self) -> &DigitSequence {
        &self.normalized_digits
    }

    #[must_use]
    pub fn raw_coefficients(&self) -> &RawCoefficients {
        &self.raw_coefficients
    }

    #[must_use]
    pub fn peak(&self) -> &BigUint {
        &self.peak
    }

    #[must_use]
    pub fn palindrome_verdict(&self) -> PalindromeVerdict {
        self.palindrome_verdict
    }

    #[must_use]
    pub fn is_approximate(&self) -> bool {
        self.is_approximate
    }

    #[must_use]
    pub fn carry_trace(&self) -> &CarryTrace {
        &self.carry_trace
    }

    #[must_use]
    pub fn mode(&self) -> ComputeMode {
        self.mode
    }

    #[must_use]
    pub fn path(&self) -> ComputePath {
        self.path
    }

    #[must_use]
    pub fn timing(&self) -> Timing {
        self.timing
    }
}
