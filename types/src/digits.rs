//! Digit sequences and the base-36 symbol alphabet.

use serde::{Deserialize, Serialize};

use crate::{Base, InputError};

/// Symbol alphabet shared by every base: `0-9` then `A-Z`.
pub const SYMBOLS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Canonical (uppercase) symbol for a digit value.
#[must_use]
pub fn symbol_for(value: u8) -> Option<char> {
    SYMBOLS.get(usize::from(value)).map(|&b| char::from(b))
}

/// Digit value of a symbol, case-insensitive. Does not check any base.
#[must_use]
pub fn value_of(symbol: char) -> Option<u8> {
    match symbol {
        '0'..='9' => Some(symbol as u8 - b'0'),
        'a'..='z' => Some(symbol as u8 - b'a' + 10),
        'A'..='Z' => Some(symbol as u8 - b'A' + 10),
        _ => None,
    }
}

/// Digits of a non-negative integer, least-significant first.
///
/// Invariant: non-empty, and every element lies in `[0, base - 1]`.
/// Most-significant zero entries are allowed; [`DigitSequence::canonical`]
/// strips them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDigitSequence")]
pub struct DigitSequence {
    base: Base,
    digits: Vec<u8>,
}

#[derive(Deserialize)]
struct RawDigitSequence {
    base: Base,
    digits: Vec<u8>,
}

impl TryFrom<RawDigitSequence> for DigitSequence {
    type Error = InputError;

    fn try_from(raw: RawDigitSequence) -> Result<Self, Self::Error> {
        Self::from_le(raw.base, raw.digits)
    }
}

impl DigitSequence {
    /// Build from least-significant-first digit values.
    pub fn from_le(base: Base, digits: Vec<u8>) -> Result<Self, InputError> {
        if digits.is_empty() {
            return Err(InputError::EmptyInput);
        }
        if let Some((position, &value)) = digits
            .iter()
            .enumerate()
            .find(|&(_, &value)| value > base.max_digit())
        {
            return Err(InputError::InvalidDigit {
                symbol: symbol_for(value).unwrap_or('?'),
                position,
                base: base.get(),
            });
        }
        Ok(Self { base, digits })
    }

    /// The single digit `0`.
    #[must_use]
    pub fn zero(base: Base) -> Self {
        Self {
            base,
            digits: vec![0],
        }
    }

    /// `count` copies of the digit `1`.
    #[must_use]
    pub fn repunit(base: Base, count: usize) -> Self {
        if count == 0 {
            return Self::zero(base);
        }
        Self {
            base,
            digits: vec![1; count],
        }
    }

    #[must_use]
    pub const fn base(&self) -> Base {
        self.base
    }

    /// Number of stored digits, including any most-significant zeros.
    #[must_use]
    pub fn digit_count(&self) -> usize {
        self.digits.len()
    }

    #[must_use]
    pub fn as_le(&self) -> &[u8] {
        &self.digits
    }

    #[must_use]
    pub fn into_le(self) -> Vec<u8> {
        self.digits
    }

    /// Digits most-significant first.
    pub fn iter_msb(&self) -> impl Iterator<Item = u8> + '_ {
        self.digits.iter().rev().copied()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.digits.iter().all(|&d| d == 0)
    }

    /// Length after dropping most-significant zeros (at least 1).
    #[must_use]
    pub fn significant_len(&self) -> usize {
        self.digits
            .iter()
            .rposition(|&d| d != 0)
            .map_or(1, |idx| idx + 1)
    }

    /// Drop most-significant zero entries, keeping a lone `0` for zero.
    #[must_use]
    pub fn canonical(mut self) -> Self {
        let len = self.significant_len();
        self.digits.truncate(len);
        self
    }
}
