//! Conversion between MSB-first text and LSB-first digit sequences.

use repsq_types::{Base, DigitSequence, InputError, symbol_for, value_of};

/// Parse MSB-first text into an LSB-first sequence.
///
/// Symbols are `0-9` then `A-Z`, case-insensitive. Surrounding whitespace is
/// ignored; most-significant zeros are kept (see [`DigitSequence::canonical`]).
pub fn decode(text: &str, base: Base) -> Result<DigitSequence, InputError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InputError::EmptyInput);
    }

    let mut digits = Vec::with_capacity(text.len());
    for (position, symbol) in text.chars().enumerate() {
        match value_of(symbol) {
            Some(value) if value <= base.max_digit() => digits.push(value),
            _ => {
                return Err(InputError::InvalidDigit {
                    symbol,
                    position,
                    base: base.get(),
                });
            }
        }
    }
    digits.reverse();
    DigitSequence::from_le(base, digits)
}

/// [`decode`] for an unvalidated radix.
pub fn decode_with_radix(text: &str, radix: u32) -> Result<DigitSequence, InputError> {
    decode(text, Base::new(radix)?)
}

/// Canonical uppercase MSB-first text; no leading zeros unless the value is zero.
#[must_use]
pub fn encode(digits: &DigitSequence) -> String {
    let significant = &digits.as_le()[..digits.significant_len()];
    significant
        .iter()
        .rev()
        .map(|&value| symbol_for(value).unwrap_or('?'))
        .collect()
}
