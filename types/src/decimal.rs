//! Serde adapters that carry big integers as decimal strings.
//!
//! Native JSON numbers lose precision past 2^53 in many runtimes, so every
//! arbitrary-precision value crosses a serialization boundary as text.

use num_bigint::BigUint;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Parse a plain decimal string (ASCII digits only).
pub fn parse(raw: &str) -> Option<BigUint> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(raw.as_bytes(), 10)
}

pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_str_radix(10))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid decimal integer: {raw:?}")))
}

/// Same as the parent module, for sequences.
pub mod seq {
    use num_bigint::BigUint;
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_str_radix(10))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<BigUint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|item| {
                super::parse(item)
                    .ok_or_else(|| D::Error::custom(format!("invalid decimal integer: {item:?}")))
            })
            .collect()
    }
}
