//! Demand-driven block producer.
//!
//! The reference implementation this is modeled on emits block heights
//! without ever checking where the chain actually is, which would run
//! ahead of a real node. This version polls `eth_blockNumber` (cached
//! implicitly by only being re-read once per loop iteration, at most
//! every `poll_interval`) and never emits past it.
//!
//! "Demand" is the bounded channel's free capacity rather than an
//! explicit counter: the channel between producer and processor pool acts
//! as the GenStage-style demand signal from the redesign notes — `send`
//! blocks until a processor is ready to pull the next height.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::RpcError;

#[async_trait]
pub trait HeadSource: Send + Sync {
    async fn block_number(&self) -> Result<u64, RpcError>;
}

#[async_trait]
impl HeadSource for crate::rpc::RpcClient {
    async fn block_number(&self) -> Result<u64, RpcError> {
        self.get_block_number().await
    }
}

/// Runs until `heights` is closed (the processor pool shut down), emitting
/// strictly increasing block numbers starting at `start_block` and never
/// exceeding the chain head (P8, S6).
pub async fn run(
    chain_id: u32,
    start_block: u64,
    head_source: &dyn HeadSource,
    poll_interval: std::time::Duration,
    heights: mpsc::Sender<u64>,
) {
    let mut next_block = start_block;
    loop {
        let head = match head_source.block_number().await {
            Ok(head) => head,
            Err(err) => {
                tracing::warn!(chain_id, %err, "failed to read chain head, retrying");
                tokio::time::sleep(poll_interval).await;
                continue;
            }
        };

        if next_block > head {
            tokio::time::sleep(poll_interval).await;
            continue;
        }

        for height in next_block..=head {
            if heights.send(height).await.is_err() {
                return;
            }
        }
        next_block = head + 1;
    }
}
