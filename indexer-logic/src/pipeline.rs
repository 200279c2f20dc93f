//! Three-stage per-chain pipeline: demand-driven block production, fan-out
//! fetch, fan-in batching, ABI resolve + decode, batched storage write.
//!
//! Modeled on the Broadway/GenStage shape from the redesign notes:
//! producer -> bounded channel -> concurrent processors -> bounded
//! channel -> batch gatherer (size-or-timeout) -> bounded channel ->
//! concurrent-but-order-preserving committers (`buffered`, not
//! `buffer_unordered`, so later blocks never commit ahead of earlier ones
//! within a chain).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use indexer_entity::{AbiRow, EventRow, TransactionRow};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::abi::{well_known_abi, AbiStore};
use crate::decode::decode_log;
use crate::error::RpcError;
use crate::producer;
use crate::rpc::{Block, Log, RpcClient};
use crate::settings::{ChainSettings, PipelineSettings};
use crate::sourcify::SourcifyClient;
use crate::storage::StorageGateway;

pub struct PipelineContext {
    pub chain: ChainSettings,
    pub rpc: Arc<RpcClient>,
    pub storage: Arc<dyn StorageGateway>,
    pub abi_store: Arc<dyn AbiStore>,
    pub sourcify: Arc<SourcifyClient>,
    pub settings: PipelineSettings,
}

struct ProcessedBlock {
    block: Block,
    logs: Vec<Log>,
}

/// Runs the pipeline until `shutdown` resolves. Returns on the first
/// unrecoverable batch failure so the supervisor can restart this chain
/// with backoff; per-message fetch failures are logged and dropped
/// without tearing down the pipeline.
pub async fn run(ctx: Arc<PipelineContext>) -> anyhow::Result<()> {
    let (height_tx, height_rx) = mpsc::channel::<u64>(ctx.settings.processor_concurrency * 2);
    let (processed_tx, processed_rx) = mpsc::channel::<ProcessedBlock>(ctx.settings.batch_size);
    let (batch_tx, batch_rx) = mpsc::channel::<Vec<ProcessedBlock>>(ctx.settings.batcher_concurrency * 2);

    let producer_ctx = ctx.clone();
    let producer_handle = tokio::spawn(async move {
        producer::run(
            producer_ctx.chain.chain_id,
            producer_ctx.chain.start_block,
            producer_ctx.rpc.as_ref(),
            producer_ctx.settings.poll_interval,
            height_tx,
        )
        .await;
    });

    let processor_ctx = ctx.clone();
    let processor_handle = tokio::spawn(async move {
        ReceiverStream::new(height_rx)
            .for_each_concurrent(processor_ctx.settings.processor_concurrency, |height| {
                let ctx = processor_ctx.clone();
                let processed_tx = processed_tx.clone();
                async move {
                    match fetch_block(&ctx, height).await {
                        Ok(Some(processed)) => {
                            let _ = processed_tx.send(processed).await;
                        }
                        Ok(None) => {
                            tracing::debug!(
                                chain_id = ctx.chain.chain_id,
                                height,
                                "block not yet available, dropping message"
                            );
                        }
                        Err(err) => {
                            tracing::warn!(
                                chain_id = ctx.chain.chain_id,
                                height,
                                %err,
                                "failed to fetch block or logs, dropping message"
                            );
                        }
                    }
                }
            })
            .await;
    });

    let gather_settings = ctx.settings;
    let gather_handle = tokio::spawn(async move {
        gather_batches(processed_rx, gather_settings.batch_size, gather_settings.batch_timeout, batch_tx).await;
    });

    let commit_ctx = ctx.clone();
    let mut commits = ReceiverStream::new(batch_rx)
        .map(|batch| {
            let ctx = commit_ctx.clone();
            async move { commit_batch(&ctx, batch).await }
        })
        .buffered(ctx.settings.batcher_concurrency);

    let mut failure = None;
    while let Some(result) = commits.next().await {
        if let Err(err) = result {
            tracing::error!(chain_id = ctx.chain.chain_id, %err, "batch commit failed");
            failure = Some(err);
            break;
        }
    }
    drop(commits);

    producer_handle.abort();
    processor_handle.abort();
    gather_handle.abort();

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn fetch_block(
    ctx: &PipelineContext,
    height: u64,
) -> Result<Option<ProcessedBlock>, RpcError> {
    let Some(block) = ctx.rpc.get_block(height).await? else {
        return Ok(None);
    };
    let logs = ctx.rpc.get_logs(height, height).await?;
    Ok(Some(ProcessedBlock { block, logs }))
}

async fn gather_batches(
    mut input: mpsc::Receiver<ProcessedBlock>,
    batch_size: usize,
    batch_timeout: Duration,
    output: mpsc::Sender<Vec<ProcessedBlock>>,
) {
    loop {
        let Some(first) = input.recv().await else {
            return;
        };
        let mut batch = vec![first];
        let deadline = tokio::time::Instant::now() + batch_timeout;

        while batch.len() < batch_size {
            match tokio::time::timeout_at(deadline, input.recv()).await {
                Ok(Some(item)) => batch.push(item),
                Ok(None) => break,
                Err(_) => break,
            }
        }

        if output.send(batch).await.is_err() {
            return;
        }
    }
}

async fn commit_batch(ctx: &PipelineContext, batch: Vec<ProcessedBlock>) -> anyhow::Result<()> {
    let chain_id = ctx.chain.chain_id;

    let addresses: Vec<String> = batch
        .iter()
        .flat_map(|b| b.logs.iter().map(|l| l.address.clone()))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut resolved = ctx.abi_store.load(chain_id, &addresses).await?;
    let missing: Vec<String> = addresses
        .iter()
        .filter(|a| !resolved.contains_key(*a))
        .cloned()
        .collect();

    if !missing.is_empty() {
        let fetched: Vec<(String, String)> = stream::iter(missing)
            .map(|address| {
                let sourcify = ctx.sourcify.clone();
                async move {
                    match sourcify.get_abi(chain_id, &address).await {
                        Ok(abi) => Some((address, abi)),
                        Err(err) => {
                            tracing::debug!(chain_id, address, %err, "sourcify lookup did not yield an abi");
                            None
                        }
                    }
                }
            })
            .buffer_unordered(ctx.settings.abi_resolve_concurrency.max(1))
            .filter_map(futures::future::ready)
            .collect()
            .await;

        if !fetched.is_empty() {
            let rows: Vec<AbiRow> = fetched
                .iter()
                .map(|(address, abi)| AbiRow {
                    chain_id,
                    address: address.clone(),
                    abi: abi.clone(),
                    created_at: now(),
                })
                .collect();
            if let Err(err) = ctx.abi_store.save(&rows).await {
                tracing::warn!(chain_id, %err, "failed to persist newly resolved abis");
            }
            resolved.extend(fetched);
        }
    }

    let mut tx_rows = Vec::new();
    let mut event_rows = Vec::new();

    for processed in &batch {
        let block = &processed.block;
        let timestamp = time::OffsetDateTime::from_unix_timestamp(block.timestamp as i64)
            .unwrap_or(time::OffsetDateTime::UNIX_EPOCH);

        for tx in &block.transactions {
            tx_rows.push(TransactionRow {
                chain_id,
                block_number: block.number,
                hash: tx.hash.clone(),
                from_address: tx.from.clone(),
                to_address: tx.to.clone().unwrap_or_default(),
                value: crate::hexutil::u256_to_decimal_string(tx.value),
                gas_price: crate::hexutil::u256_to_decimal_string(tx.gas_price),
                gas: tx.gas,
                input: tx.input.clone(),
                receipt_status: 0,
                timestamp,
            });
        }

        for log in &processed.logs {
            event_rows.push(build_event_row(chain_id, log, &resolved));
        }
    }

    if !tx_rows.is_empty() {
        ctx.storage.insert_transactions(&tx_rows).await?;
    }
    if !event_rows.is_empty() {
        ctx.storage.insert_events(&event_rows).await?;
    }

    Ok(())
}

fn build_event_row(chain_id: u32, log: &Log, resolved: &HashMap<String, String>) -> EventRow {
    let topic0 = log.topics.first().cloned();
    let abi_json = topic0
        .as_deref()
        .and_then(|t0| resolved.get(&log.address).cloned().or_else(|| well_known_abi(t0).map(str::to_string)));

    let decoded = abi_json.and_then(|abi| decode_log(&abi, topic0.as_deref(), &log.topics, &log.data));

    EventRow {
        chain_id,
        block_number: log.block_number,
        transaction_hash: log.transaction_hash.clone(),
        transaction_index: log.transaction_index,
        log_index: log.log_index,
        address: log.address.clone(),
        topic0: log.topics.first().cloned(),
        topic1: log.topics.get(1).cloned(),
        topic2: log.topics.get(2).cloned(),
        topic3: log.topics.get(3).cloned(),
        data: log.data.clone(),
        event_name: decoded.as_ref().map(|d| d.event_name.clone()),
        params: decoded.map(|d| serde_json::to_string(&d.params).unwrap_or_default()),
    }
}

fn now() -> time::OffsetDateTime {
    time::OffsetDateTime::now_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::InMemoryAbiStore;
    use crate::rpc::Transaction;
    use crate::settings::SourcifySettings;
    use crate::storage::InMemoryGateway;
    use ethereum_types::U256;

    fn sample_block(number: u64) -> Block {
        Block {
            number,
            hash: format!("0x{number:064x}"),
            timestamp: 1_700_000_000,
            transactions: vec![Transaction {
                hash: "0xdeadbeef".to_string(),
                from: "0xaaaa".to_string(),
                to: None,
                value: U256::zero(),
                gas_price: U256::from(1_000_000_000u64),
                gas: 21_000,
                input: "0x".to_string(),
            }],
        }
    }

    fn sample_log(block_number: u64) -> Log {
        Log {
            address: "0xcccc".to_string(),
            topics: vec![
                "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef".to_string(),
                format!("0x{}{}", "00".repeat(12), "aa".repeat(20)),
                format!("0x{}{}", "00".repeat(12), "bb".repeat(20)),
            ],
            data: format!("0x{}{}", "00".repeat(30), "03e8"),
            block_number,
            transaction_hash: "0xdeadbeef".to_string(),
            transaction_index: 0,
            log_index: 0,
        }
    }

    fn test_ctx(storage: Arc<InMemoryGateway>, abi_store: Arc<InMemoryAbiStore>) -> PipelineContext {
        PipelineContext {
            chain: ChainSettings {
                chain_id: 1,
                rpc_url: "http://localhost".parse().unwrap(),
                start_block: 0,
            },
            rpc: Arc::new(RpcClient::new(1, reqwest::Client::new(), "http://localhost".parse().unwrap(), Duration::from_secs(1))),
            storage,
            abi_store,
            sourcify: Arc::new(SourcifyClient::new(&SourcifySettings::default())),
            settings: PipelineSettings::default(),
        }
    }

    #[tokio::test]
    async fn commit_batch_falls_back_to_well_known_abi() {
        let storage = Arc::new(InMemoryGateway::default());
        let abi_store = Arc::new(InMemoryAbiStore::default());
        let ctx = test_ctx(storage.clone(), abi_store);

        let batch = vec![ProcessedBlock {
            block: sample_block(100),
            logs: vec![sample_log(100)],
        }];

        commit_batch(&ctx, batch).await.unwrap();

        let events = storage.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name.as_deref(), Some("Transfer"));

        let txs = storage.transactions.lock().unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].to_address, "");
        assert_eq!(txs[0].gas, 21_000);
    }

    #[tokio::test]
    async fn failed_insert_fails_the_whole_batch() {
        let storage = Arc::new(InMemoryGateway::default());
        storage
            .fail_next
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let abi_store = Arc::new(InMemoryAbiStore::default());
        let ctx = test_ctx(storage.clone(), abi_store);

        let batch = vec![ProcessedBlock {
            block: sample_block(100),
            logs: vec![],
        }];

        assert!(commit_batch(&ctx, batch).await.is_err());
        assert!(storage.transactions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn gather_batches_flushes_on_size() {
        let (tx, rx) = mpsc::channel(200);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        for n in 0..100 {
            tx.send(ProcessedBlock {
                block: sample_block(n),
                logs: vec![],
            })
            .await
            .unwrap();
        }
        drop(tx);

        tokio::spawn(gather_batches(rx, 100, Duration::from_millis(1000), out_tx));
        let batch = out_rx.recv().await.unwrap();
        assert_eq!(batch.len(), 100);
    }

    #[tokio::test]
    async fn gather_batches_flushes_on_timeout() {
        let (tx, rx) = mpsc::channel(200);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        for n in 0..30 {
            tx.send(ProcessedBlock {
                block: sample_block(n),
                logs: vec![],
            })
            .await
            .unwrap();
        }

        tokio::spawn(gather_batches(rx, 100, Duration::from_millis(50), out_tx));
        let batch = out_rx.recv().await.unwrap();
        assert_eq!(batch.len(), 30);
        drop(tx);
    }
}
