//! Palindrome classification of normalized digits.

use repsq_types::PalindromeVerdict;

/// Classify `digits` (LSB first). Approximate input is never classified.
#[must_use]
pub fn classify(digits: &[u8], is_approximate: bool) -> PalindromeVerdict {
    if is_approximate {
        return PalindromeVerdict::Indeterminate;
    }
    PalindromeVerdict::from_bool(is_palindrome(digits))
}

/// Compare the significant digits against their reverse.
///
/// Most-significant zeros are trimmed first; a single digit or an all-zero
/// sequence is trivially a palindrome.
#[must_use]
pub fn is_palindrome(digits: &[u8]) -> bool {
    let len = digits.iter().rposition(|&d| d != 0).map_or(0, |idx| idx + 1);
    let significant = &digits[..len];
    significant
        .iter()
        .zip(significant.iter().rev())
        .take(len / 2)
        .all(|(a, b)| a == b)
}
