mod settings;

pub use settings::Settings;

use std::sync::Arc;

use indexer_logic::abi::ClickhouseAbiStore;
use indexer_logic::storage::ClickhouseGateway;
use indexer_logic::supervisor;

const SERVICE_NAME: &str = "indexer";

/// Wires up storage, the ABI store and the Sourcify client, and runs the
/// chain supervisor until the process is killed.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        chains = settings.indexer.chains.len(),
        "{SERVICE_NAME} starting"
    );

    let storage = Arc::new(ClickhouseGateway::new(&settings.indexer.clickhouse));
    let abi_store = Arc::new(ClickhouseAbiStore::new(&settings.indexer.clickhouse));

    supervisor::run(settings.indexer, storage, abi_store).await
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    // A previous call (tests constructing their own subscriber) is not an
    // error worth failing startup over.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
