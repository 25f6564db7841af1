//! Determinism digest: a SHA-256 fingerprint over the defining fields of an
//! exact result.
//!
//! The canonical form is JSON with lexicographically sorted keys, no
//! insignificant whitespace, UTF-8 encoded. Big integers are decimal strings.
//! Timing and diagnostics never enter the digest.

use std::collections::BTreeMap;
use std::fmt::Write;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use repsq_types::{Base, ComputeResult, DigitSequence};

use crate::codec::encode;

pub const DETERMINISM_SCHEMA: &str = "repsq/determinism@1";

/// The minimal field set that determines a digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeterminismInput {
    pub schema: String,
    pub base: Base,
    pub root_digits: String,
    pub square_digits: String,
    pub peak: String,
    pub is_palindrome: bool,
}

impl DeterminismInput {
    #[must_use]
    pub fn new(
        base: Base,
        root_digits: impl Into<String>,
        square_digits: impl Into<String>,
        peak: &BigUint,
        is_palindrome: bool,
    ) -> Self {
        Self {
            schema: DETERMINISM_SCHEMA.to_string(),
            base,
            root_digits: root_digits.into(),
            square_digits: square_digits.into(),
            peak: peak.to_str_radix(10),
            is_palindrome,
        }
    }

    /// `None` for approximate results: inexact output has no digest.
    #[must_use]
    pub fn from_result(root: &DigitSequence, result: &ComputeResult) -> Option<Self> {
        if result.is_approximate() {
            return None;
        }
        let is_palindrome = result.palindrome_verdict().as_bool()?;
        Some(Self::new(
            root.base(),
            encode(root),
            encode(result.normalized_digits()),
            result.peak(),
            is_palindrome,
        ))
    }

    /// Sorted-key, whitespace-free JSON.
    ///
    /// Built from an explicit `BTreeMap` so key order never depends on
    /// serde_json's map feature flags.
    #[must_use]
    pub fn canonical_json(&self) -> String {
        let fields: BTreeMap<&str, Value> = BTreeMap::from([
            ("base", Value::from(self.base.get())),
            ("isPalindrome", Value::from(self.is_palindrome)),
            ("peak", Value::from(self.peak.as_str())),
            ("rootDigits", Value::from(self.root_digits.as_str())),
            ("schema", Value::from(self.schema.as_str())),
            ("squareDigits", Value::from(self.square_digits.as_str())),
        ]);
        serde_json::to_string(&fields).expect("string-keyed map of plain values serializes")
    }
}

/// Lowercase hex SHA-256 (64 characters) of the canonical JSON.
#[must_use]
pub fn compute_digest(input: &DeterminismInput) -> String {
    let digest = Sha256::digest(input.canonical_json().as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}
