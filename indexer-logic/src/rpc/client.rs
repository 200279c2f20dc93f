use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use crate::error::RpcError;
use crate::hexutil;

use super::types::{Block, JsonRpcEnvelope, Log, WireBlock, WireLog};

/// Stateless (besides the request-id counter) JSON-RPC 2.0 client bound to
/// one chain's endpoint. The pipeline holds one instance per configured
/// chain, each wrapping its own `reqwest::Client` for connection pooling.
pub struct RpcClient {
    chain_id: u32,
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(chain_id: u32, http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            chain_id,
            http,
            base_url,
            timeout,
            next_id: AtomicU64::new(1),
        }
    }

    #[tracing::instrument(skip(self), fields(chain_id = self.chain_id, method = %method))]
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let response = self
            .http
            .post(self.base_url.clone())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(chain_id = self.chain_id, %status, "rpc call returned non-200");
            return Err(RpcError::Http(status.as_u16()));
        }

        let envelope: JsonRpcEnvelope<T> = response.json().await?;
        if let Some(error) = envelope.error {
            tracing::warn!(chain_id = self.chain_id, code = error.code, "rpc call returned error");
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(envelope.result)
    }

    /// `eth_getBlockByNumber(hex(n), true)`. Returns `Ok(None)` when the
    /// node reports the block doesn't exist yet.
    pub async fn get_block(&self, number: u64) -> Result<Option<Block>, RpcError> {
        let params = json!([hexutil::u64_to_hex(number), true]);
        match self.call::<WireBlock>("eth_getBlockByNumber", params).await? {
            Some(wire) => Ok(Some(Block::try_from(wire)?)),
            None => Ok(None),
        }
    }

    /// `eth_getLogs({fromBlock, toBlock})`.
    pub async fn get_logs(&self, from: u64, to: u64) -> Result<Vec<Log>, RpcError> {
        let params = json!([{
            "fromBlock": hexutil::u64_to_hex(from),
            "toBlock": hexutil::u64_to_hex(to),
        }]);
        let wire: Vec<WireLog> = self
            .call::<Vec<WireLog>>("eth_getLogs", params)
            .await?
            .unwrap_or_default();
        wire.into_iter().map(Log::try_from).collect()
    }

    /// `eth_blockNumber`, used by the block producer to track chain head.
    pub async fn get_block_number(&self) -> Result<u64, RpcError> {
        let result: Option<String> = self.call("eth_blockNumber", json!([])).await?;
        let hex = result.ok_or_else(|| {
            RpcError::InvalidResponse("eth_blockNumber returned null".to_string())
        })?;
        hexutil::hex_to_u64(&hex).map_err(|e| RpcError::InvalidResponse(e.to_string()))
    }
}
