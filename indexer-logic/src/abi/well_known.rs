//! Fallback ABI entries for extremely common events, consulted when
//! neither the persistent store nor Sourcify has metadata for an address.
//! This lets standard ERC20/ERC721 events decode without a network
//! round trip — additive only, it never changes the persisted-row
//! contract (the fallback is never itself written to the `abis` table).

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::decode::{canonical_signature, topic0};

const TRANSFER_ABI: &str = r#"[{"type":"event","name":"Transfer","anonymous":false,"inputs":[
    {"name":"from","type":"address","indexed":true},
    {"name":"to","type":"address","indexed":true},
    {"name":"value","type":"uint256","indexed":false}
]}]"#;

const APPROVAL_ABI: &str = r#"[{"type":"event","name":"Approval","anonymous":false,"inputs":[
    {"name":"owner","type":"address","indexed":true},
    {"name":"spender","type":"address","indexed":true},
    {"name":"value","type":"uint256","indexed":false}
]}]"#;

const APPROVAL_FOR_ALL_ABI: &str = r#"[{"type":"event","name":"ApprovalForAll","anonymous":false,"inputs":[
    {"name":"owner","type":"address","indexed":true},
    {"name":"operator","type":"address","indexed":true},
    {"name":"approved","type":"bool","indexed":false}
]}]"#;

fn table() -> &'static HashMap<String, &'static str> {
    static TABLE: OnceLock<HashMap<String, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use ethabi::param_type::ParamType;

        let mut m = HashMap::new();
        m.insert(
            topic0(&canonical_signature(
                "Transfer",
                &[ParamType::Address, ParamType::Address, ParamType::Uint(256)],
            )),
            TRANSFER_ABI,
        );
        m.insert(
            topic0(&canonical_signature(
                "Approval",
                &[ParamType::Address, ParamType::Address, ParamType::Uint(256)],
            )),
            APPROVAL_ABI,
        );
        m.insert(
            topic0(&canonical_signature(
                "ApprovalForAll",
                &[ParamType::Address, ParamType::Address, ParamType::Bool],
            )),
            APPROVAL_FOR_ALL_ABI,
        );
        m
    })
}

/// Returns the ABI JSON for a well-known event matching `topic0`, if any.
pub fn well_known_abi(topic0: &str) -> Option<&'static str> {
    table().get(&topic0.to_lowercase()).copied()
}
