use async_trait::async_trait;
use indexer_entity::{AbiRow, EventRow, TransactionRow};

use crate::error::StorageError;

/// Batched writes into the three persisted tables. Each method is a single
/// wire-level insert: on failure nothing from that call is visible (no
/// partial commit), and the pipeline treats the whole batch as failed.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn insert_transactions(&self, rows: &[TransactionRow]) -> Result<(), StorageError>;
    async fn insert_events(&self, rows: &[EventRow]) -> Result<(), StorageError>;
    async fn insert_abis(&self, rows: &[AbiRow]) -> Result<(), StorageError>;
}

/// `clickhouse`-backed gateway. Table DDL lives outside this crate; see the
/// doc comments on `indexer_entity`'s row types for the expected shape.
pub struct ClickhouseGateway {
    client: clickhouse::Client,
}

impl ClickhouseGateway {
    pub fn new(settings: &crate::settings::ClickhouseSettings) -> Self {
        let mut client = clickhouse::Client::default()
            .with_url(&settings.url)
            .with_database(&settings.database);
        if let Some(user) = &settings.user {
            client = client.with_user(user);
        }
        if let Some(password) = &settings.password {
            client = client.with_password(password);
        }
        Self { client }
    }

    async fn insert_batch<T>(&self, table: &'static str, rows: &[T]) -> Result<(), StorageError>
    where
        T: clickhouse::Row + serde::Serialize,
    {
        if rows.is_empty() {
            return Ok(());
        }
        let mut insert = self
            .client
            .insert(table)
            .map_err(|source| StorageError::InsertFailed {
                table,
                source: source.into(),
            })?;
        for row in rows {
            insert
                .write(row)
                .await
                .map_err(|source| StorageError::InsertFailed {
                    table,
                    source: source.into(),
                })?;
        }
        insert.end().await.map_err(|source| StorageError::InsertFailed {
            table,
            source: source.into(),
        })
    }
}

#[async_trait]
impl StorageGateway for ClickhouseGateway {
    async fn insert_transactions(&self, rows: &[TransactionRow]) -> Result<(), StorageError> {
        self.insert_batch("transactions", rows).await
    }

    async fn insert_events(&self, rows: &[EventRow]) -> Result<(), StorageError> {
        self.insert_batch("events", rows).await
    }

    async fn insert_abis(&self, rows: &[AbiRow]) -> Result<(), StorageError> {
        self.insert_batch("abis", rows).await
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Mutex;

    use super::*;

    /// In-memory fake used by pipeline tests. Records every row passed to
    /// it; `fail_next` lets a test exercise the batch-atomicity path (P7).
    #[derive(Default)]
    pub struct InMemoryGateway {
        pub transactions: Mutex<Vec<TransactionRow>>,
        pub events: Mutex<Vec<EventRow>>,
        pub abis: Mutex<Vec<AbiRow>>,
        pub fail_next: std::sync::atomic::AtomicBool,
    }

    impl InMemoryGateway {
        fn maybe_fail(&self, table: &'static str) -> Result<(), StorageError> {
            if self
                .fail_next
                .swap(false, std::sync::atomic::Ordering::SeqCst)
            {
                return Err(StorageError::InsertFailed {
                    table,
                    source: anyhow::anyhow!("injected failure"),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StorageGateway for InMemoryGateway {
        async fn insert_transactions(&self, rows: &[TransactionRow]) -> Result<(), StorageError> {
            self.maybe_fail("transactions")?;
            self.transactions.lock().unwrap().extend_from_slice(rows);
            Ok(())
        }

        async fn insert_events(&self, rows: &[EventRow]) -> Result<(), StorageError> {
            self.maybe_fail("events")?;
            self.events.lock().unwrap().extend_from_slice(rows);
            Ok(())
        }

        async fn insert_abis(&self, rows: &[AbiRow]) -> Result<(), StorageError> {
            self.maybe_fail("abis")?;
            self.abis.lock().unwrap().extend_from_slice(rows);
            Ok(())
        }
    }
}
