use serde::{Deserialize, Serialize};

/// One row of the `abis` table.
///
/// ```sql
/// CREATE TABLE abis (
///     chain_id    UInt32,
///     address     String,
///     abi         String,  -- JSON
///     created_at  DateTime
/// ) ENGINE = MergeTree
/// ORDER BY (chain_id, address)
/// ```
///
/// Append-only: the store enforces no uniqueness on `(chain_id, address)`.
/// Two pipelines discovering the same ABI independently may both insert;
/// readers tolerate duplicates by picking any matching row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, clickhouse::Row)]
pub struct AbiRow {
    pub chain_id: u32,
    pub address: String,
    pub abi: String,
    #[serde(with = "clickhouse::serde::time::datetime")]
    pub created_at: time::OffsetDateTime,
}
