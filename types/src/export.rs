//! Result payload handed to export and UI collaborators.

use serde::{Deserialize, Serialize};

use crate::{Base, ComputeMode, PalindromeVerdict};

pub const EXPORT_SCHEMA_VERSION: u32 = 1;

/// Observable fields of a finished result, in display form.
///
/// Digit strings are canonical MSB-first text and `peak` is a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub schema_version: u32,
    pub base: Base,
    pub root_digits: String,
    pub normalized_square_digits: String,
    pub peak: String,
    pub is_palindrome: PalindromeVerdict,
    pub mode: ComputeMode,
    pub is_approximate: bool,
}
