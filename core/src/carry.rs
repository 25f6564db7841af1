//! Carry normalization of raw coefficients into base-b digits.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

use repsq_types::{Base, CarryTrace, CarryTraceEntry, DigitSequence};

/// Default ceiling for the estimated in-memory size of a carry trace (5 MiB).
pub const DEFAULT_TRACE_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Fixed per-entry cost: position, digit, three big-integer headers.
const TRACE_ENTRY_OVERHEAD_BYTES: usize = 96;

/// Whether the caller wants a per-position carry trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceRequest {
    #[default]
    Skip,
    Collect {
        max_bytes: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub digits: DigitSequence,
    pub trace: CarryTrace,
}

/// Rough upper estimate of the memory a full trace over `raw` would take.
#[must_use]
pub fn estimate_trace_bytes(raw: &[BigUint], base: Base) -> usize {
    let peak_bits = raw.iter().map(BigUint::bits).max().unwrap_or(0);
    let value_bytes = usize::try_from(peak_bits.div_ceil(8)).unwrap_or(usize::MAX);
    let per_entry = TRACE_ENTRY_OVERHEAD_BYTES.saturating_add(value_bytes.saturating_mul(3));
    // The final carry has at most about as many bits as the peak, so it
    // drains into roughly peak_bits / log2(base) extra positions.
    let drain = usize::try_from(peak_bits / u64::from(base.get().ilog2()) + 1).unwrap_or(usize::MAX);
    raw.len().saturating_add(drain).saturating_mul(per_entry)
}

/// Propagate carries through `raw`, least-significant position first.
///
/// Every output digit lies in `[0, base - 1]`. Once the coefficients run out,
/// any remaining carry is drained into extra digits. A requested trace whose
/// estimated size exceeds its limit is reported as omitted rather than built.
#[must_use]
pub fn normalize(raw: &[BigUint], base: Base, trace: TraceRequest) -> Normalized {
    let mut entries = match trace {
        TraceRequest::Skip => None,
        TraceRequest::Collect { max_bytes } => {
            let estimate = estimate_trace_bytes(raw, base);
            if estimate > max_bytes {
                tracing::debug!(
                    estimate,
                    max_bytes,
                    positions = raw.len(),
                    "Carry trace omitted"
                );
                return Normalized {
                    digits: propagate(raw, base, &mut None),
                    trace: CarryTrace::Omitted {
                        reason: format!(
                            "estimated carry trace size of {estimate} bytes exceeds the {max_bytes} byte limit"
                        ),
                    },
                };
            }
            Some(Vec::with_capacity(raw.len() + 1))
        }
    };

    let digits = propagate(raw, base, &mut entries);
    let trace = match entries {
        Some(entries) => CarryTrace::Collected { entries },
        None => CarryTrace::NotRequested,
    };
    Normalized { digits, trace }
}

fn propagate(
    raw: &[BigUint],
    base: Base,
    entries: &mut Option<Vec<CarryTraceEntry>>,
) -> DigitSequence {
    let divisor = BigUint::from(base.get());
    let zero = BigUint::zero();
    let mut carry = BigUint::zero();
    let mut digits = Vec::with_capacity(raw.len() + 1);

    let mut position = 0;
    let mut coefficients = raw.iter();
    loop {
        let coefficient = match coefficients.next() {
            Some(coefficient) => coefficient,
            None if !carry.is_zero() => &zero,
            None => break,
        };

        let (quotient, remainder) = (coefficient + &carry).div_rem(&divisor);
        let digit_out = remainder
            .to_u8()
            .expect("remainder of division by base fits in a digit");
        let incoming_carry = std::mem::replace(&mut carry, quotient);
        digits.push(digit_out);

        if let Some(entries) = entries.as_mut() {
            entries.push(CarryTraceEntry {
                position,
                raw_coefficient: coefficient.clone(),
                incoming_carry,
                digit_out,
                outgoing_carry: carry.clone(),
            });
        }
        position += 1;
    }

    DigitSequence::from_le(base, digits)
        .map(DigitSequence::canonical)
        .unwrap_or_else(|_| DigitSequence::zero(base))
}
