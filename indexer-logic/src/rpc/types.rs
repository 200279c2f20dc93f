//! Wire shapes returned by `eth_getBlockByNumber`/`eth_getLogs`, and the
//! normalized in-process types the rest of the crate works with. Every
//! integral field on the wire is a `0x`-prefixed hex string; normalization
//! happens once, here, rather than being re-parsed by every consumer.

use ethereum_types::U256;
use serde::Deserialize;

use crate::error::RpcError;
use crate::hexutil;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub hash: String,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: U256,
    pub gas_price: U256,
    pub gas: u64,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub transaction_index: u32,
    pub log_index: u32,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireBlock {
    number: String,
    hash: String,
    timestamp: String,
    #[serde(default)]
    transactions: Vec<WireTransaction>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireTransaction {
    hash: String,
    from: String,
    to: Option<String>,
    value: String,
    #[serde(rename = "gasPrice")]
    gas_price: String,
    gas: String,
    input: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireLog {
    address: String,
    topics: Vec<String>,
    data: String,
    #[serde(rename = "blockNumber")]
    block_number: String,
    #[serde(rename = "transactionHash")]
    transaction_hash: String,
    #[serde(rename = "transactionIndex")]
    transaction_index: String,
    #[serde(rename = "logIndex")]
    log_index: String,
}

impl TryFrom<WireBlock> for Block {
    type Error = RpcError;

    fn try_from(w: WireBlock) -> Result<Self, Self::Error> {
        Ok(Block {
            number: hexutil::hex_to_u64(&w.number)
                .map_err(|e| RpcError::InvalidResponse(format!("block number: {e}")))?,
            hash: w.hash,
            timestamp: hexutil::hex_to_u64(&w.timestamp)
                .map_err(|e| RpcError::InvalidResponse(format!("timestamp: {e}")))?,
            transactions: w
                .transactions
                .into_iter()
                .map(Transaction::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TryFrom<WireTransaction> for Transaction {
    type Error = RpcError;

    fn try_from(w: WireTransaction) -> Result<Self, Self::Error> {
        Ok(Transaction {
            hash: w.hash,
            from: hexutil::normalize_address(&w.from),
            to: w.to.map(|a| hexutil::normalize_address(&a)),
            value: hexutil::hex_to_u256(&w.value),
            gas_price: hexutil::hex_to_u256(&w.gas_price),
            gas: hexutil::hex_to_u64(&w.gas)
                .map_err(|e| RpcError::InvalidResponse(format!("gas: {e}")))?,
            input: w.input,
        })
    }
}

impl TryFrom<WireLog> for Log {
    type Error = RpcError;

    fn try_from(w: WireLog) -> Result<Self, Self::Error> {
        Ok(Log {
            address: hexutil::normalize_address(&w.address),
            topics: w.topics,
            data: w.data,
            block_number: hexutil::hex_to_u64(&w.block_number)
                .map_err(|e| RpcError::InvalidResponse(format!("log block number: {e}")))?,
            transaction_hash: w.transaction_hash,
            transaction_index: hexutil::hex_to_u64(&w.transaction_index)
                .map_err(|e| RpcError::InvalidResponse(format!("transaction index: {e}")))?
                as u32,
            log_index: hexutil::hex_to_u64(&w.log_index)
                .map_err(|e| RpcError::InvalidResponse(format!("log index: {e}")))?
                as u32,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct JsonRpcEnvelope<T> {
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub(super) struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
}
