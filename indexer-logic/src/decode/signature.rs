//! Canonical event signatures and the topic0 they hash to.

use ethabi::param_type::ParamType;
use sha3::{Digest, Keccak256};

/// `Name(type1,type2,…)`, no spaces, tuple components expanded as
/// `(t1,t2,…)`. This is the string keccak256 is applied to (P1).
pub fn canonical_signature(name: &str, inputs: &[ParamType]) -> String {
    let types: Vec<String> = inputs.iter().map(canonical_type).collect();
    format!("{name}({})", types.join(","))
}

fn canonical_type(t: &ParamType) -> String {
    match t {
        ParamType::Tuple(fields) => {
            let inner: Vec<String> = fields.iter().map(canonical_type).collect();
            format!("({})", inner.join(","))
        }
        ParamType::Array(inner) => format!("{}[]", canonical_type(inner)),
        ParamType::FixedArray(inner, n) => format!("{}[{n}]", canonical_type(inner)),
        other => other.to_string(),
    }
}

/// `"0x" + lower_hex(keccak256(signature))`.
pub fn topic0(signature: &str) -> String {
    let mut hasher = Keccak256::new();
    hasher.update(signature.as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erc20_transfer_topic0_matches_well_known_value() {
        let sig = canonical_signature(
            "Transfer",
            &[ParamType::Address, ParamType::Address, ParamType::Uint(256)],
        );
        assert_eq!(sig, "Transfer(address,address,uint256)");
        assert_eq!(
            topic0(&sig),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn tuple_components_are_expanded() {
        let sig = canonical_signature(
            "Batch",
            &[ParamType::Tuple(vec![ParamType::Uint(256), ParamType::Bool])],
        );
        assert_eq!(sig, "Batch((uint256,bool))");
    }
}
