mod decoder;
mod signature;
mod value;

pub use decoder::{decode_log, Decoded};
pub use signature::{canonical_signature, topic0};
pub use value::{decode_scalar_slot, encode_scalar_slot, to_json, DecodedValue};
