use repsq_types::{ComputeResult, DigitSequence, EXPORT_SCHEMA_VERSION, ExportPayload};

use crate::codec::encode;

/// Display-form payload for a finished result.
#[must_use]
pub fn export_payload(root: &DigitSequence, result: &ComputeResult) -> ExportPayload {
    ExportPayload {
        schema_version: EXPORT_SCHEMA_VERSION,
        base: root.base(),
        root_digits: encode(root),
        normalized_square_digits: encode(result.normalized_digits()),
        peak: result.peak().to_str_radix(10),
        is_palindrome: result.palindrome_verdict(),
        mode: result.mode(),
        is_approximate: result.is_approximate(),
    }
}
