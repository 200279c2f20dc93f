//! Chain supervisor.
//!
//! Starts one pipeline per configured chain and restarts it with
//! exponential backoff (capped) when it returns or panics. One chain's
//! failures never touch another's: each runs in its own task, and a
//! panic is caught at the task boundary by `JoinHandle` rather than
//! allowed to unwind into the supervisor.

use std::sync::Arc;
use std::time::Duration;

use crate::abi::AbiStore;
use crate::pipeline::{self, PipelineContext};
use crate::rpc::RpcClient;
use crate::settings::Settings;
use crate::sourcify::SourcifyClient;
use crate::storage::StorageGateway;

/// Runs every configured chain's pipeline until the process is killed.
/// Returns only if every chain's supervising task itself fails to spawn,
/// which should not happen in practice.
pub async fn run(
    settings: Settings,
    storage: Arc<dyn StorageGateway>,
    abi_store: Arc<dyn AbiStore>,
) -> anyhow::Result<()> {
    let sourcify = Arc::new(SourcifyClient::new(&settings.sourcify));
    let restart_cap = settings.pipeline.restart_delay_cap;

    let handles: Vec<_> = settings
        .chains
        .into_iter()
        .map(|chain| {
            let storage = storage.clone();
            let abi_store = abi_store.clone();
            let sourcify = sourcify.clone();
            let pipeline_settings = settings.pipeline;
            tokio::spawn(async move {
                supervise_chain(
                    chain,
                    storage,
                    abi_store,
                    sourcify,
                    pipeline_settings,
                    restart_cap,
                )
                .await;
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}

async fn supervise_chain(
    chain: crate::settings::ChainSettings,
    storage: Arc<dyn StorageGateway>,
    abi_store: Arc<dyn AbiStore>,
    sourcify: Arc<SourcifyClient>,
    pipeline_settings: crate::settings::PipelineSettings,
    restart_cap: Duration,
) {
    let chain_id = chain.chain_id;
    let rpc = Arc::new(RpcClient::new(
        chain_id,
        reqwest::Client::new(),
        chain.rpc_url.clone(),
        pipeline_settings.rpc_timeout,
    ));

    let mut backoff = Duration::from_secs(1);
    loop {
        let ctx = Arc::new(PipelineContext {
            chain: chain.clone(),
            rpc: rpc.clone(),
            storage: storage.clone(),
            abi_store: abi_store.clone(),
            sourcify: sourcify.clone(),
            settings: pipeline_settings,
        });

        tracing::info!(chain_id, "starting pipeline");
        let result = tokio::spawn(pipeline::run(ctx)).await;

        match result {
            Ok(Ok(())) => {
                tracing::warn!(chain_id, "pipeline exited cleanly, restarting");
            }
            Ok(Err(err)) => {
                tracing::error!(chain_id, %err, "pipeline failed, restarting with backoff");
            }
            Err(join_err) => {
                tracing::error!(chain_id, %join_err, "pipeline task panicked, restarting with backoff");
            }
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(restart_cap);
    }
}
