use indexer_logic::settings::Settings as IndexerSettings;

/// Top-level process settings. A thin wrapper around the logic crate's own
/// `Settings` so the binary has a single, obvious entry point even though
/// there's currently only one settings group to load.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub indexer: IndexerSettings,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let indexer = IndexerSettings::from_env()
            .map_err(|e| anyhow::anyhow!("failed to read configuration: {e}"))?;
        Ok(Self { indexer })
    }
}
