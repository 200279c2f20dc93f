//! Hex-string <-> integer conversion, address normalization, topic padding.
//!
//! Every JSON-RPC integral field (`blockNumber`, `gas`, `gasPrice`, ...)
//! arrives as a `0x`-prefixed hex string; every address and topic arrives as
//! a fixed-width hex string. This module is the single place those get
//! turned into Rust values and back.

use ethereum_types::U256;

/// Strips an optional `0x`/`0X` prefix and parses the remainder as base-16.
/// An empty string (or bare `"0x"`) parses as zero.
pub fn hex_to_u64(s: &str) -> Result<u64, std::num::ParseIntError> {
    let s = strip_prefix(s);
    if s.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(s, 16)
}

/// Parses a `0x`-prefixed (or bare) hex string as a u256. Malformed input
/// (non-hex characters) is treated as zero, matching the leniency the
/// reference ingestor applies to oddly-formatted RPC responses.
pub fn hex_to_u256(s: &str) -> U256 {
    let s = strip_prefix(s);
    if s.is_empty() {
        return U256::zero();
    }
    U256::from_str_radix(s, 16).unwrap_or_else(|_| U256::zero())
}

/// Renders `n` as a `0x`-prefixed hex string with no leading zeros (beyond a
/// single `0` for the value zero itself), matching `hex(hex_to_int(h)) ==
/// strip_leading_zeros(h)` (P9).
pub fn u64_to_hex(n: u64) -> String {
    format!("0x{n:x}")
}

pub fn u256_to_hex(n: U256) -> String {
    format!("0x{n:x}")
}

/// Decimal-string encoding of a u256, used whenever the value crosses a JSON
/// boundary so arbitrary-precision integers don't lose precision in an f64.
pub fn u256_to_decimal_string(n: U256) -> String {
    n.to_string()
}

fn strip_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Lowercases an address and ensures a leading `0x` (P3). Idempotent:
/// `normalize_address(normalize_address(a)) == normalize_address(a)`.
pub fn normalize_address(address: &str) -> String {
    let address = strip_prefix(address.trim());
    format!("0x{}", address.to_lowercase())
}

/// True iff `s` is a syntactically valid `0x`-prefixed 32-byte hex string
/// (66 characters total), as used for transaction hashes and topics.
pub fn is_32_byte_hex(s: &str) -> bool {
    s.len() == 66 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Decodes a `0x`-prefixed 32-byte hex string into its raw bytes. Returns
/// `None` if the string isn't exactly 32 bytes of hex.
pub fn decode_32_bytes(s: &str) -> Option<[u8; 32]> {
    if !is_32_byte_hex(s) {
        return None;
    }
    let mut out = [0u8; 32];
    hex::decode_to_slice(&s[2..], &mut out).ok()?;
    Some(out)
}

/// Splits a hex-encoded data payload (with or without a `0x` prefix, may be
/// empty) into consecutive 32-byte slots. Any trailing partial chunk (not a
/// multiple of 64 hex chars) is dropped, since it can't represent a full
/// scalar slot.
pub fn data_slots(data: &str) -> Vec<[u8; 32]> {
    let data = strip_prefix(data);
    let bytes = match hex::decode(data) {
        Ok(bytes) => bytes,
        Err(_) => return Vec::new(),
    };
    bytes
        .chunks_exact(32)
        .map(|chunk| {
            let mut slot = [0u8; 32];
            slot.copy_from_slice(chunk);
            slot
        })
        .collect()
}
