//! Self-convolution: pre-carry squaring coefficients.

use std::sync::atomic::{AtomicBool, Ordering};

use num_bigint::BigUint;
use num_traits::Zero;
use thiserror::Error;

use repsq_types::RawCoefficients;

/// Outer-loop iterations between two interruption checks.
pub const CHECKPOINT_INTERVAL: usize = 64;

/// Cooperative interruption point polled by long-running loops.
///
/// This only shortens the time a terminated context keeps burning CPU;
/// termination itself never depends on it.
pub trait Checkpoint {
    fn should_stop(&self) -> bool;
}

impl Checkpoint for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<F> Checkpoint for F
where
    F: Fn() -> bool,
{
    fn should_stop(&self) -> bool {
        self()
    }
}

/// A checkpoint that never fires. Used where termination is external (a killed process).
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverInterrupt;

impl Checkpoint for NeverInterrupt {
    fn should_stop(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("computation interrupted at a checkpoint")]
pub struct Interrupted;

/// Square `digits` (LSB first) without carrying.
///
/// Returns `2m - 1` coefficients for `m` digits, or `[0]` for an empty slice.
/// Polls `checkpoint` every [`CHECKPOINT_INTERVAL`] outer iterations and
/// bails out with [`Interrupted`] instead of returning partial output.
pub fn self_convolve<C>(digits: &[u8], checkpoint: &C) -> Result<RawCoefficients, Interrupted>
where
    C: Checkpoint + ?Sized,
{
    if digits.is_empty() {
        return Ok(RawCoefficients::new(vec![BigUint::zero()]));
    }

    let mut coefficients = vec![BigUint::zero(); 2 * digits.len() - 1];
    for (i, &left) in digits.iter().enumerate() {
        if i % CHECKPOINT_INTERVAL == 0 && checkpoint.should_stop() {
            return Err(Interrupted);
        }
        if left == 0 {
            continue;
        }
        let left = u32::from(left);
        for (j, &right) in digits.iter().enumerate() {
            if right != 0 {
                coefficients[i + j] += left * u32::from(right);
            }
        }
    }
    Ok(RawCoefficients::new(coefficients))
}

/// A single coefficient `sum(d[i] * d[k - i])`, in O(m).
#[must_use]
pub fn coefficient_at(digits: &[u8], k: usize) -> BigUint {
    let mut sum = BigUint::zero();
    let m = digits.len();
    if m == 0 || k > 2 * (m - 1) {
        return sum;
    }
    let lo = k.saturating_sub(m - 1);
    let hi = k.min(m - 1);
    for i in lo..=hi {
        let product = u32::from(digits[i]) * u32::from(digits[k - i]);
        if product != 0 {
            sum += product;
        }
    }
    sum
}
