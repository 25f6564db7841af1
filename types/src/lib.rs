//! Core domain types for repsq.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

pub mod decimal;
mod digits;
mod export;
mod ids;
mod result;

pub use digits::{DigitSequence, SYMBOLS, symbol_for, value_of};
pub use export::{EXPORT_SCHEMA_VERSION, ExportPayload};
pub use ids::JobId;
pub use result::{
    CarryTrace, CarryTraceEntry, ComputePath, ComputeResult, RawCoefficients, Timing,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Input validation
// ============================================================================

/// Validation failures reported synchronously, before any job exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("base must be between {min} and {max} (got {0})", min = Base::MIN, max = Base::MAX)]
    InvalidBase(u32),
    #[error("digit string must not be empty")]
    EmptyInput,
    #[error("invalid digit {symbol:?} at position {position} for base {base}")]
    InvalidDigit {
        symbol: char,
        position: usize,
        base: u8,
    },
}

// ============================================================================
// Base
// ============================================================================

/// Positional radix in `[2, 36]`.
///
/// Existence of a `Base` is the proof that the radix is in range; the symbol
/// alphabet and the carry divisor both derive from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Base(u8);

impl Base {
    pub const MIN: u8 = 2;
    pub const MAX: u8 = 36;
    pub const DECIMAL: Base = Base(10);
    pub const BINARY: Base = Base(2);

    pub fn new(radix: u32) -> Result<Self, InputError> {
        match u8::try_from(radix) {
            Ok(value) if (Self::MIN..=Self::MAX).contains(&value) => Ok(Self(value)),
            _ => Err(InputError::InvalidBase(radix)),
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Largest digit value representable in this base.
    #[must_use]
    pub const fn max_digit(self) -> u8 {
        self.0 - 1
    }
}

impl TryFrom<u32> for Base {
    type Error = InputError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Base> for u32 {
    fn from(value: Base) -> Self {
        u32::from(value.0)
    }
}

impl std::fmt::Display for Base {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Modes
// ============================================================================

/// Execution path a result was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeMode {
    #[default]
    Exact,
    Preview,
}

impl ComputeMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ComputeMode::Exact => "exact",
            ComputeMode::Preview => "preview",
        }
    }
}

/// Mode requested by a caller; `Auto` defers to the exact-digit budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSelection {
    Exact,
    Preview,
    #[default]
    Auto,
}

impl ModeSelection {
    /// Pick a concrete mode. `Auto` stays exact up to `safe_digits_exact` digits.
    #[must_use]
    pub const fn resolve(self, digit_count: usize, safe_digits_exact: usize) -> ComputeMode {
        match self {
            ModeSelection::Exact => ComputeMode::Exact,
            ModeSelection::Preview => ComputeMode::Preview,
            ModeSelection::Auto => {
                if digit_count <= safe_digits_exact {
                    ComputeMode::Exact
                } else {
                    ComputeMode::Preview
                }
            }
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "exact" => Some(ModeSelection::Exact),
            "preview" | "approx" => Some(ModeSelection::Preview),
            "auto" => Some(ModeSelection::Auto),
            _ => None,
        }
    }
}

// ============================================================================
// Palindrome verdict
// ============================================================================

/// Three-way palindrome classification.
///
/// Serialized as `true`, `false`, or the string `"indeterminate"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "VerdictRepr", into = "VerdictRepr")]
pub enum PalindromeVerdict {
    Palindrome,
    NotPalindrome,
    Indeterminate,
}

impl PalindromeVerdict {
    #[must_use]
    pub const fn from_bool(is_palindrome: bool) -> Self {
        if is_palindrome {
            PalindromeVerdict::Palindrome
        } else {
            PalindromeVerdict::NotPalindrome
        }
    }

    /// `None` when the verdict is indeterminate.
    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            PalindromeVerdict::Palindrome => Some(true),
            PalindromeVerdict::NotPalindrome => Some(false),
            PalindromeVerdict::Indeterminate => None,
        }
    }

    #[must_use]
    pub const fn is_definite(self) -> bool {
        !matches!(self, PalindromeVerdict::Indeterminate)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PalindromeVerdict::Palindrome => "palindrome",
            PalindromeVerdict::NotPalindrome => "not palindrome",
            PalindromeVerdict::Indeterminate => "indeterminate",
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum VerdictRepr {
    Definite(bool),
    Marker(IndeterminateMarker),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum IndeterminateMarker {
    Indeterminate,
}

impl From<VerdictRepr> for PalindromeVerdict {
    fn from(value: VerdictRepr) -> Self {
        match value {
            VerdictRepr::Definite(flag) => PalindromeVerdict::from_bool(flag),
            VerdictRepr::Marker(IndeterminateMarker::Indeterminate) => {
                PalindromeVerdict::Indeterminate
            }
        }
    }
}

impl From<PalindromeVerdict> for VerdictRepr {
    fn from(value: PalindromeVerdict) -> Self {
        match value.as_bool() {
            Some(flag) => VerdictRepr::Definite(flag),
            None => VerdictRepr::Marker(IndeterminateMarker::Indeterminate),
        }
    }
}
