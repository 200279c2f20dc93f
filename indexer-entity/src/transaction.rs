use serde::{Deserialize, Serialize};

/// One row of the `transactions` table.
///
/// ```sql
/// CREATE TABLE transactions (
///     chain_id        UInt32,
///     block_number    UInt64,
///     hash            String,
///     from_address    String,
///     to_address      String,
///     value           String,  -- decimal-encoded u256
///     gas_price       String,  -- decimal-encoded u256
///     gas             UInt64,
///     input           String,
///     receipt_status  UInt8,
///     timestamp       DateTime
/// ) ENGINE = MergeTree
/// ORDER BY (chain_id, block_number, hash)
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, clickhouse::Row)]
pub struct TransactionRow {
    pub chain_id: u32,
    pub block_number: u64,
    pub hash: String,
    pub from_address: String,
    /// Empty string on contract creation (`to` was `null` in the RPC response).
    pub to_address: String,
    /// Decimal-encoded `u256`, to survive the JSON/wire boundary without precision loss.
    pub value: String,
    pub gas_price: String,
    pub gas: u64,
    pub input: String,
    /// Always 0 until a receipt fetch is added; see the pipeline's batch commit step.
    pub receipt_status: u8,
    #[serde(with = "clickhouse::serde::time::datetime")]
    pub timestamp: time::OffsetDateTime,
}
