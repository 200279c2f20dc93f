use serde::{Deserialize, Serialize};

/// One row of the `events` table.
///
/// ```sql
/// CREATE TABLE events (
///     chain_id           UInt32,
///     block_number       UInt64,
///     transaction_hash   String,
///     transaction_index  UInt32,
///     log_index          UInt32,
///     address            String,
///     topic0             Nullable(String),
///     topic1             Nullable(String),
///     topic2             Nullable(String),
///     topic3             Nullable(String),
///     data               String,
///     event_name         Nullable(String),
///     params             Nullable(String)  -- JSON-encoded
/// ) ENGINE = MergeTree
/// ORDER BY (chain_id, block_number, transaction_hash, log_index)
/// ```
///
/// `event_name` and `params` are both null or both non-null (never one
/// without the other) — a log that failed to decode, or whose `topic0`
/// didn't match any known ABI entry, is stored with both null and its raw
/// topics/data preserved verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, clickhouse::Row)]
pub struct EventRow {
    pub chain_id: u32,
    pub block_number: u64,
    pub transaction_hash: String,
    pub transaction_index: u32,
    pub log_index: u32,
    pub address: String,
    pub topic0: Option<String>,
    pub topic1: Option<String>,
    pub topic2: Option<String>,
    pub topic3: Option<String>,
    pub data: String,
    pub event_name: Option<String>,
    /// JSON object of the event's non-anonymous input names to decoded values,
    /// in ABI declaration order.
    pub params: Option<String>,
}
