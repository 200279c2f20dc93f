//! Scalar 32-byte-slot decoding and the JSON serialization rules for
//! decoded values.
//!
//! Only static, single-word ABI types (`address`, `uintN`, `intN`, `bool`,
//! `bytesN`) are actually decoded from a slot. Dynamic types (`string`,
//! `bytes`, arrays, tuples) are deliberately left as the raw 32 bytes —
//! full head/tail ABI decoding of dynamic non-indexed parameters is out of
//! scope here (see the module-level note in `decoder.rs`).

use ethabi::param_type::ParamType;
use ethereum_types::U256;
use serde_json::Value;

/// A value produced by decoding. Composite variants exist for the
/// serialization rules below even though the current slot decoder never
/// constructs them — they document the full shape a complete decoder
/// would eventually need.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Scalar(Value),
    Tuple(Vec<DecodedValue>),
    List(Vec<DecodedValue>),
    Bytes(Vec<u8>),
}

pub fn to_json(value: &DecodedValue) -> Value {
    match value {
        DecodedValue::Scalar(v) => v.clone(),
        DecodedValue::Tuple(items) | DecodedValue::List(items) => {
            Value::Array(items.iter().map(to_json).collect())
        }
        DecodedValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::String(format!("0x{}", hex::encode(bytes))),
        },
    }
}

/// Decodes one 32-byte slot according to `param_type`, following the
/// scalar rules in the spec's §4.5: `address` takes the last 20 bytes,
/// `uintN`/`intN` parse the whole word as a big-endian integer (two's
/// complement for signed types), `bool` is true on any nonzero nibble,
/// `bytesN` returns its first `N` bytes, and everything else (dynamic
/// types) is returned as the raw slot hex.
pub fn decode_scalar_slot(param_type: &ParamType, slot: &[u8; 32]) -> DecodedValue {
    match param_type {
        ParamType::Address => {
            DecodedValue::Scalar(Value::String(format!("0x{}", hex::encode(&slot[12..32]))))
        }
        ParamType::Uint(_) => DecodedValue::Scalar(uint_value(slot)),
        ParamType::Int(bits) => DecodedValue::Scalar(int_value(slot, *bits)),
        ParamType::Bool => DecodedValue::Scalar(Value::Bool(slot.iter().any(|b| *b != 0))),
        ParamType::FixedBytes(size) => {
            let size = (*size).min(32);
            DecodedValue::Scalar(Value::String(format!("0x{}", hex::encode(&slot[..size]))))
        }
        _ => DecodedValue::Scalar(Value::String(format!("0x{}", hex::encode(slot)))),
    }
}

fn uint_value(slot: &[u8; 32]) -> Value {
    let n = U256::from_big_endian(slot);
    json_integer(&n.to_string())
}

fn int_value(slot: &[u8; 32], bits: usize) -> Value {
    let n = U256::from_big_endian(slot);
    let sign_bit = U256::one() << (bits - 1);
    if n < sign_bit {
        return json_integer(&n.to_string());
    }
    // Two's-complement negation. `bits == 256` can't express `1 << 256` in a
    // `U256`, so wrap instead of subtracting from a modulus: `-n == !n + 1`.
    let magnitude = if bits < 256 {
        (U256::one() << bits) - n
    } else {
        (!n).overflowing_add(U256::one()).0
    };
    json_integer(&format!("-{magnitude}"))
}

/// Builds a `serde_json::Value::Number` from a base-10 integer literal
/// without round-tripping through `f64` (the crate's `arbitrary_precision`
/// feature keeps the digits exact).
fn json_integer(decimal: &str) -> Value {
    serde_json::from_str(decimal).expect("decimal integer literal is valid JSON")
}

/// Inverse of [`decode_scalar_slot`] for the static types it actually
/// decodes. Exists so tests can assert P2 (round-trip decode): for a log
/// whose `topic0` resolves to an ABI entry with only static types, decoding
/// then re-encoding must reproduce the original 32-byte slot exactly.
pub fn encode_scalar_slot(param_type: &ParamType, value: &Value) -> Option<[u8; 32]> {
    match param_type {
        ParamType::Address => {
            let bytes = hex::decode(value.as_str()?.trim_start_matches("0x")).ok()?;
            if bytes.len() != 20 {
                return None;
            }
            let mut slot = [0u8; 32];
            slot[12..32].copy_from_slice(&bytes);
            Some(slot)
        }
        ParamType::Uint(_) => {
            let mut slot = [0u8; 32];
            decimal_to_u256(value)?.to_big_endian(&mut slot);
            Some(slot)
        }
        ParamType::Int(bits) => {
            let mut slot = [0u8; 32];
            signed_decimal_to_u256(value, *bits)?.to_big_endian(&mut slot);
            Some(slot)
        }
        ParamType::Bool => {
            let mut slot = [0u8; 32];
            if value.as_bool()? {
                slot[31] = 1;
            }
            Some(slot)
        }
        ParamType::FixedBytes(size) => {
            let bytes = hex::decode(value.as_str()?.trim_start_matches("0x")).ok()?;
            let size = (*size).min(32).min(bytes.len());
            let mut slot = [0u8; 32];
            slot[..size].copy_from_slice(&bytes[..size]);
            Some(slot)
        }
        _ => None,
    }
}

fn decimal_to_u256(value: &Value) -> Option<U256> {
    match value {
        Value::Number(n) => U256::from_dec_str(&n.to_string()).ok(),
        _ => None,
    }
}

/// Inverse of `int_value`'s two's-complement conversion: rebuilds the raw
/// 256-bit word from the signed decimal JSON produced by decoding.
fn signed_decimal_to_u256(value: &Value, bits: usize) -> Option<U256> {
    let Value::Number(n) = value else {
        return None;
    };
    let text = n.to_string();
    match text.strip_prefix('-') {
        None => U256::from_dec_str(&text).ok(),
        Some(magnitude_str) => {
            let magnitude = U256::from_dec_str(magnitude_str).ok()?;
            Some(if bits < 256 {
                (U256::one() << bits) - magnitude
            } else {
                (!magnitude).overflowing_add(U256::one()).0
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slot_from_hex(hex_str: &str) -> [u8; 32] {
        let bytes = hex::decode(hex_str).unwrap();
        let mut slot = [0u8; 32];
        slot.copy_from_slice(&bytes);
        slot
    }

    #[test]
    fn decodes_address_from_last_20_bytes() {
        let slot =
            slot_from_hex("000000000000000000000000aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let v = decode_scalar_slot(&ParamType::Address, &slot);
        assert_eq!(to_json(&v), Value::String("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".into()));
    }

    #[test]
    fn decodes_uint256_value() {
        let slot = slot_from_hex(&format!("{}{}", "00".repeat(30), "03e8"));
        let v = decode_scalar_slot(&ParamType::Uint(256), &slot);
        assert_eq!(to_json(&v), serde_json::json!(1000));
    }

    #[test]
    fn decodes_negative_int() {
        let slot = [0xffu8; 32];
        let v = decode_scalar_slot(&ParamType::Int(256), &slot);
        assert_eq!(to_json(&v), serde_json::json!(-1));
    }

    #[test]
    fn decodes_bool_on_any_nonzero_nibble() {
        let mut slot = [0u8; 32];
        slot[31] = 1;
        assert_eq!(to_json(&decode_scalar_slot(&ParamType::Bool, &slot)), Value::Bool(true));
        assert_eq!(
            to_json(&decode_scalar_slot(&ParamType::Bool, &[0u8; 32])),
            Value::Bool(false)
        );
    }

    #[test]
    fn dynamic_type_returns_raw_slot_hex() {
        let slot = [0x11u8; 32];
        let v = decode_scalar_slot(&ParamType::String, &slot);
        assert_eq!(to_json(&v), Value::String(format!("0x{}", "11".repeat(32))));
    }

    #[test]
    fn bytes_value_renders_as_utf8_when_valid() {
        let v = DecodedValue::Bytes(b"hello".to_vec());
        assert_eq!(to_json(&v), Value::String("hello".to_string()));
    }

    #[test]
    fn bytes_value_renders_as_hex_when_not_utf8() {
        let v = DecodedValue::Bytes(vec![0xff, 0xfe]);
        assert_eq!(to_json(&v), Value::String("0xfffe".to_string()));
    }

    #[test]
    fn encode_address_round_trips_decode() {
        let slot =
            slot_from_hex("000000000000000000000000aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let value = to_json(&decode_scalar_slot(&ParamType::Address, &slot));
        let re_encoded = encode_scalar_slot(&ParamType::Address, &value).unwrap();
        assert_eq!(re_encoded, slot);
    }

    #[test]
    fn encode_uint256_round_trips_decode() {
        let slot = slot_from_hex(&format!("{}{}", "00".repeat(30), "03e8"));
        let value = to_json(&decode_scalar_slot(&ParamType::Uint(256), &slot));
        let re_encoded = encode_scalar_slot(&ParamType::Uint(256), &value).unwrap();
        assert_eq!(re_encoded, slot);
    }

    #[test]
    fn encode_negative_int256_round_trips_decode() {
        let slot = [0xffu8; 32];
        let value = to_json(&decode_scalar_slot(&ParamType::Int(256), &slot));
        assert_eq!(value, serde_json::json!(-1));
        let re_encoded = encode_scalar_slot(&ParamType::Int(256), &value).unwrap();
        assert_eq!(re_encoded, slot);
    }

    #[test]
    fn encode_negative_int8_round_trips_decode() {
        // -1 as a declared int8 follows the same literal-formula decode as
        // int256 here: the whole 32-byte word is parsed as one big integer
        // and the bit-width only governs the modulus, per spec.md §4.5.
        let slot = slot_from_hex(&format!("{}ff", "00".repeat(31)));
        let value = to_json(&decode_scalar_slot(&ParamType::Int(8), &slot));
        assert_eq!(value, serde_json::json!(-1));
        let re_encoded = encode_scalar_slot(&ParamType::Int(8), &value).unwrap();
        assert_eq!(re_encoded, slot);
    }
}
