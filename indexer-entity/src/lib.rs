//! Row types persisted into the columnar store.
//!
//! These mirror the three tables described in the configuration section of
//! the system: `transactions`, `events`, `abis`. Table creation (the
//! `CREATE TABLE` DDL itself) is owned by separate migration tooling, not by
//! this crate; the doc comment on each row documents the expected shape so
//! that tooling has something to follow.

pub mod abi;
pub mod event;
pub mod transaction;

pub use abi::AbiRow;
pub use event::EventRow;
pub use transaction::TransactionRow;
