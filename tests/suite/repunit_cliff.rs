//! Repunit classification across every supported base.

use num_bigint::BigUint;

use repsq_core::palindrome::is_palindrome;
use repsq_core::repunit::square_repunit;
use repsq_core::{Base, ComputePath, TraceRequest, classify_repunit};

use crate::common::exact;

fn base(radix: u32) -> Base {
    Base::new(radix).unwrap()
}

#[test]
fn cliff_sits_at_the_base_for_three_and_up() {
    for radix in 3..=36u32 {
        let b = base(radix);
        let last_good = radix as usize - 1;
        assert!(classify_repunit(b, last_good).is_palindrome, "base {radix}");
        assert!(!classify_repunit(b, last_good + 1).is_palindrome, "base {radix}");
    }
}

#[test]
fn binary_breaks_after_two() {
    assert!(classify_repunit(Base::BINARY, 2).is_palindrome);
    assert!(!classify_repunit(Base::BINARY, 3).is_palindrome);
}

#[test]
fn classification_matches_materialized_square_at_the_cliff() {
    for radix in 2..=36u32 {
        let b = base(radix);
        let edge = if radix == 2 { 2 } else { radix as usize - 1 };
        for length in [edge, edge + 1] {
            let result = square_repunit(b, length, TraceRequest::Skip);
            assert_eq!(
                Some(is_palindrome(result.normalized_digits().as_le())),
                result.palindrome_verdict().as_bool(),
                "base {radix} length {length}"
            );
        }
    }
}

#[test]
fn peak_law_holds_for_large_lengths() {
    for length in [1usize, 64, 4096, 10_000_000] {
        assert_eq!(classify_repunit(base(17), length).peak, BigUint::from(length));
    }
}

#[test]
fn scheduler_path_uses_the_fast_path_for_repunits() {
    let root = "1".repeat(36);
    let result = exact(&root, 36);
    assert_eq!(result.path(), ComputePath::Repunit);
    assert_eq!(result.peak(), &BigUint::from(36u32));
    assert_eq!(result.palindrome_verdict().as_bool(), Some(false));

    let result = exact(&"1".repeat(35), 36);
    assert_eq!(result.palindrome_verdict().as_bool(), Some(true));
}
