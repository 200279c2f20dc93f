use indexer_server::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    indexer_server::run(settings).await
}
