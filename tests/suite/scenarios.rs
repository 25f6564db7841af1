//! End-to-end scenarios through the public compute, export, and digest APIs.

use num_bigint::BigUint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use repsq_core::{
    Base, ComputeMode, ComputeOptions, ComputePath, ComputeRequest, DeterminismInput,
    NeverInterrupt, PalindromeVerdict, compute, compute_digest, decode, encode, export_payload,
};
use repsq_types::SYMBOLS;

use crate::common::{exact, preview};

fn assert_scenario(digits: &str, radix: u32, square: &str, peak: Option<u32>, palindrome: bool) {
    let result = exact(digits, radix);
    assert_eq!(encode(result.normalized_digits()), square, "{digits} base {radix}");
    if let Some(peak) = peak {
        assert_eq!(result.peak(), &BigUint::from(peak));
    }
    assert_eq!(
        result.palindrome_verdict(),
        PalindromeVerdict::from_bool(palindrome)
    );
    assert!(!result.is_approximate());
}

#[test]
fn nine_ones() {
    assert_scenario("111111111", 10, "12345678987654321", Some(9), true);
}

#[test]
fn ten_ones() {
    assert_scenario("1111111111", 10, "1234567900987654321", Some(10), false);
}

#[test]
fn binary_two_ones() {
    assert_scenario("11", 2, "1001", None, true);
}

#[test]
fn binary_three_ones() {
    assert_scenario("111", 2, "110001", None, false);
}

#[test]
fn one_zero_one() {
    assert_scenario("101", 10, "10201", Some(2), true);
}

#[test]
fn preview_is_always_indeterminate() {
    for (digits, radix) in [("101", 10), ("12321", 10), ("1011", 2), ("ZYX", 36), ("10", 3)] {
        let result = preview(digits, radix);
        assert_eq!(
            result.palindrome_verdict(),
            PalindromeVerdict::Indeterminate,
            "{digits} base {radix}"
        );
        assert!(result.is_approximate());
    }
}

#[test]
fn normalized_digits_stay_in_range() {
    for radix in [2u32, 7, 10, 16, 36] {
        let top = repsq_types::symbol_for((radix - 1) as u8)
            .unwrap()
            .to_string()
            .repeat(60);
        let result = exact(&top, radix);
        assert!(
            result
                .normalized_digits()
                .as_le()
                .iter()
                .all(|&d| u32::from(d) < radix)
        );
    }
}

#[test]
fn carry_trace_chains() {
    let request = ComputeRequest::parse("ZZZZZZ", 36, ComputeMode::Exact)
        .unwrap()
        .with_options(ComputeOptions {
            collect_trace: true,
            ..ComputeOptions::default()
        });
    let result = compute(&request, &NeverInterrupt).unwrap();
    let entries = result.carry_trace().entries().unwrap();
    for pair in entries.windows(2) {
        assert_eq!(pair[0].outgoing_carry, pair[1].incoming_carry);
    }
    for entry in entries {
        let total = &entry.raw_coefficient + &entry.incoming_carry;
        assert_eq!(total.clone() % 36u32, BigUint::from(entry.digit_out));
        assert_eq!(total / 36u32, entry.outgoing_carry);
    }
}

#[test]
fn codec_round_trips() {
    for (text, radix) in [("0", 10), ("1001", 2), ("ZZ9A", 36), ("7FFF", 16)] {
        let base = Base::new(radix).unwrap();
        assert_eq!(encode(&decode(text, base).unwrap()), text);
    }
    let base = Base::new(16).unwrap();
    assert_eq!(encode(&decode("00abc", base).unwrap()), "ABC");
}

#[test]
fn export_and_digest_agree_on_canonical_fields() {
    let root = decode("0111111111", Base::DECIMAL).unwrap();
    let result = exact("0111111111", 10);
    assert_eq!(result.path(), ComputePath::Repunit);

    let export = export_payload(&root, &result);
    assert_eq!(export.root_digits, "111111111");
    assert_eq!(export.normalized_square_digits, "12345678987654321");
    assert_eq!(export.peak, "9");

    let input = DeterminismInput::from_result(&root, &result).unwrap();
    assert_eq!(
        compute_digest(&input),
        "903660bc10ee71a95fa92fda0c65014059b2e092f4e28faf3630857605254967"
    );
}

#[test]
fn exact_computation_is_deterministic() {
    let root = crate::common::slow_root(300);
    let first = exact(&root, 10);
    let second = exact(&root, 10);
    assert_eq!(first.normalized_digits(), second.normalized_digits());
    assert_eq!(first.peak(), second.peak());
    assert_eq!(first.palindrome_verdict(), second.palindrome_verdict());
}

/// Random digit strings in `radix`, mixed case, sometimes with leading zeros.
fn random_digits(rng: &mut StdRng, radix: u32) -> String {
    let len = rng.gen_range(1..=48);
    let mut text: String = (0..len)
        .map(|_| {
            let symbol = char::from(SYMBOLS[rng.gen_range(0..radix as usize)]);
            if rng.gen_bool(0.5) {
                symbol.to_ascii_lowercase()
            } else {
                symbol
            }
        })
        .collect();
    if rng.gen_bool(0.2) {
        text.insert_str(0, &"0".repeat(rng.gen_range(1..4)));
    }
    text
}

fn canonical_text(text: &str) -> String {
    let trimmed = text.trim_start_matches('0').to_ascii_uppercase();
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed
    }
}

#[test]
fn seeded_inputs_match_bigint_oracle_in_every_base() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0001);
    for radix in 2..=36u32 {
        let base = Base::new(radix).unwrap();
        for _ in 0..40 {
            let digits = random_digits(&mut rng, radix);
            let context = format!("{digits:?} base {radix}");

            let request = ComputeRequest::parse(&digits, radix, ComputeMode::Exact)
                .unwrap()
                .with_options(ComputeOptions {
                    collect_trace: true,
                    ..ComputeOptions::default()
                });
            let result = compute(&request, &NeverInterrupt).unwrap();

            let root = BigUint::parse_bytes(digits.as_bytes(), radix).unwrap();
            let expected = (&root * &root).to_str_radix(radix).to_ascii_uppercase();
            let square = encode(result.normalized_digits());
            assert_eq!(square, expected, "{context}");

            assert!(
                result.normalized_digits().as_le().iter().all(|&d| u32::from(d) < radix),
                "{context}"
            );
            let reversed: String = square.chars().rev().collect();
            assert_eq!(
                result.palindrome_verdict(),
                PalindromeVerdict::from_bool(reversed == square),
                "{context}"
            );

            let entries = result.carry_trace().entries().unwrap();
            for pair in entries.windows(2) {
                assert_eq!(pair[0].outgoing_carry, pair[1].incoming_carry, "{context}");
            }
            for entry in entries {
                let total = &entry.raw_coefficient + &entry.incoming_carry;
                assert_eq!(total.clone() % radix, BigUint::from(entry.digit_out), "{context}");
                assert_eq!(total / radix, entry.outgoing_carry, "{context}");
            }

            let decoded = decode(&digits, base).unwrap();
            assert_eq!(encode(&decoded), canonical_text(&digits), "{context}");
            assert_eq!(
                decode(&encode(&decoded), base).unwrap(),
                decoded.clone().canonical(),
                "{context}"
            );
        }
    }
}
