//! The compute pipeline: picks a path and assembles a [`ComputeResult`].

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use repsq_types::{
    ComputeMode, ComputePath, ComputeResult, DigitSequence, InputError, Timing,
};

use crate::carry::{self, DEFAULT_TRACE_MAX_BYTES, TraceRequest};
use crate::codec::decode_with_radix;
use crate::convolution::{Checkpoint, Interrupted, self_convolve};
use crate::palindrome;
use crate::preview::{self, MAX_SAMPLES, MAX_WINDOW, PreviewLimits};
use crate::repunit::{is_repunit, square_repunit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ComputeError {
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// Per-computation knobs that never change the numeric answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeOptions {
    pub collect_trace: bool,
    pub trace_max_bytes: usize,
    pub preview_window: usize,
    pub preview_samples: usize,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            collect_trace: false,
            trace_max_bytes: DEFAULT_TRACE_MAX_BYTES,
            preview_window: MAX_WINDOW,
            preview_samples: MAX_SAMPLES,
        }
    }
}

impl ComputeOptions {
    #[must_use]
    pub fn trace_request(&self) -> TraceRequest {
        if self.collect_trace {
            TraceRequest::Collect {
                max_bytes: self.trace_max_bytes,
            }
        } else {
            TraceRequest::Skip
        }
    }

    #[must_use]
    pub fn preview_limits(&self) -> PreviewLimits {
        PreviewLimits::new(self.preview_window, self.preview_samples)
    }
}

/// A validated root plus how to square it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeRequest {
    pub root: DigitSequence,
    pub mode: ComputeMode,
    pub options: ComputeOptions,
}

impl ComputeRequest {
    #[must_use]
    pub fn new(root: DigitSequence, mode: ComputeMode) -> Self {
        Self {
            root,
            mode,
            options: ComputeOptions::default(),
        }
    }

    /// Validate `digits` against `radix` and build a request.
    pub fn parse(digits: &str, radix: u32, mode: ComputeMode) -> Result<Self, InputError> {
        Ok(Self::new(decode_with_radix(digits, radix)?, mode))
    }

    #[must_use]
    pub fn with_options(mut self, options: ComputeOptions) -> Self {
        self.options = options;
        self
    }
}

/// Square `request.root`.
///
/// Repunit roots always take the closed-form path and come back exact, even
/// when a preview was requested. Other roots go through the convolution
/// (exact) or the approximator (preview). Only the convolution polls
/// `checkpoint`.
pub fn compute<C>(request: &ComputeRequest, checkpoint: &C) -> Result<ComputeResult, ComputeError>
where
    C: Checkpoint + ?Sized,
{
    let started = Instant::now();
    let root = request.root.clone().canonical();
    let base = root.base();
    let digits = root.as_le();
    let trace = request.options.trace_request();

    let (result, coefficients_elapsed, carry_elapsed) = if is_repunit(digits) {
        // The closed form leaves nothing to time separately from the carry pass.
        let stage = Instant::now();
        let result = square_repunit(base, digits.len(), trace);
        (result, Duration::ZERO, stage.elapsed())
    } else {
        match request.mode {
            ComputeMode::Exact => {
                let stage = Instant::now();
                let raw = self_convolve(digits, checkpoint)?;
                let peak = raw.peak();
                let coefficients_elapsed = stage.elapsed();

                let stage = Instant::now();
                let normalized = carry::normalize(raw.as_slice(), base, trace);
                let is_palindrome = palindrome::is_palindrome(normalized.digits.as_le());
                let result = ComputeResult::exact(
                    normalized.digits,
                    raw,
                    peak,
                    is_palindrome,
                    normalized.trace,
                    ComputePath::Convolution,
                );
                (result, coefficients_elapsed, stage.elapsed())
            }
            ComputeMode::Preview => {
                let stage = Instant::now();
                let result =
                    preview::preview_square(&root, request.options.preview_limits(), trace);
                (result, stage.elapsed(), Duration::ZERO)
            }
        }
    };

    let total = started.elapsed();
    tracing::debug!(
        base = base.get(),
        digits = digits.len(),
        path = ?result.path(),
        verdict = result.palindrome_verdict().as_str(),
        elapsed_us = total.as_micros(),
        "Square computed"
    );

    Ok(result.with_timing(Timing {
        coefficients_us: micros(coefficients_elapsed),
        carry_us: micros(carry_elapsed),
        total_us: micros(total),
    }))
}

fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}
