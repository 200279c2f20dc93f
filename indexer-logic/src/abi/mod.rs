//! Persistent ABI store and the well-known-signature fallback that backs
//! it when neither the store nor Sourcify has an answer.

mod store;
mod well_known;

pub use store::{AbiStore, ClickhouseAbiStore};
pub use well_known::well_known_abi;

#[cfg(test)]
pub use store::test_support::InMemoryAbiStore;
