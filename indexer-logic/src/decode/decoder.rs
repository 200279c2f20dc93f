//! Event log decoder.
//!
//! Resolves a log's ABI entry by signature, splits inputs into indexed and
//! non-indexed groups, and decodes each 32-byte slot with the scalar rules
//! in `value.rs`. This intentionally does not implement full ABI head/tail
//! decoding for dynamic non-indexed types (`string`, `bytes`, arrays):
//! every non-indexed slot is decoded as if it were a scalar, which is
//! correct for the static types and an approximation for dynamic ones.
//! Closing that gap means teaching this module to walk the dynamic-type
//! head/tail layout spec-compliant ABI encoders use, not a small patch.

use ethabi::{Contract, Event};
use serde_json::{Map, Value};

use crate::hexutil;

use super::value::{decode_scalar_slot, to_json};

/// Decoded output for a single log. Both fields are `None` together: a
/// decode failure is not an error, it just means the log is stored raw.
pub struct Decoded {
    pub event_name: String,
    pub params: Map<String, Value>,
}

pub fn decode_log(
    abi_json: &str,
    topic0: Option<&str>,
    topics: &[String],
    data: &str,
) -> Option<Decoded> {
    let topic0 = topic0?;
    let contract: Contract = serde_json::from_str(abi_json).ok()?;
    let event = find_event(&contract, topic0)?;

    let (indexed, non_indexed): (Vec<_>, Vec<_>) =
        event.inputs.iter().partition(|input| input.indexed);

    let mut params = Map::new();

    for (input, topic) in indexed.iter().zip(topics.iter().skip(1)) {
        if let Some(slot) = hexutil::decode_32_bytes(topic) {
            let value = decode_scalar_slot(&input.kind, &slot);
            params.insert(input.name.clone(), to_json(&value));
        }
    }

    let slots = hexutil::data_slots(data);
    for (input, slot) in non_indexed.iter().zip(slots.iter()) {
        let value = decode_scalar_slot(&input.kind, slot);
        params.insert(input.name.clone(), to_json(&value));
    }

    Some(Decoded {
        event_name: event.name.clone(),
        params,
    })
}

fn find_event<'a>(contract: &'a Contract, topic0: &str) -> Option<&'a Event> {
    let target = topic0.trim_start_matches("0x").to_lowercase();
    contract
        .events
        .values()
        .flatten()
        .find(|event| format!("{:x}", event.signature()) == target)
}
