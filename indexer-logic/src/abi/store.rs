use std::collections::HashMap;

use async_trait::async_trait;
use indexer_entity::AbiRow;

use crate::error::StorageError;
use crate::settings::ClickhouseSettings;

/// Persistent `(chain_id, address) -> abi_json` lookup. Separate from
/// [`crate::storage::StorageGateway`] because it needs a read path, not
/// just batched inserts: the store's own `save` delegates to the
/// gateway's `insert_abis`.
#[async_trait]
pub trait AbiStore: Send + Sync {
    async fn load(
        &self,
        chain_id: u32,
        addresses: &[String],
    ) -> Result<HashMap<String, String>, StorageError>;

    async fn save(&self, rows: &[AbiRow]) -> Result<(), StorageError>;
}

#[derive(serde::Deserialize, clickhouse::Row)]
struct AddressAbi {
    address: String,
    abi: String,
}

pub struct ClickhouseAbiStore {
    client: clickhouse::Client,
}

impl ClickhouseAbiStore {
    pub fn new(settings: &ClickhouseSettings) -> Self {
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
}

#[async_trait]
impl AbiStore for ClickhouseAbiStore {
    async fn load(
        &self,
        chain_id: u32,
        addresses: &[String],
    ) -> Result<HashMap<String, String>, StorageError> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<AddressAbi> = self
            .client
            .query("SELECT address, abi FROM abis WHERE chain_id = ? AND address IN ?")
            .bind(chain_id)
            .bind(addresses)
            .fetch_all()
            .await
            .map_err(|source| StorageError::InsertFailed {
                table: "abis",
                source: source.into(),
            })?;
        Ok(rows.into_iter().map(|r| (r.address, r.abi)).collect())
    }

    async fn save(&self, rows: &[AbiRow]) -> Result<(), StorageError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut insert = self
            .client
            .insert("abis")
            .map_err(|source| StorageError::InsertFailed {
                table: "abis",
                source: source.into(),
            })?;
        for row in rows {
            insert
                .write(row)
                .await
                .map_err(|source| StorageError::InsertFailed {
                    table: "abis",
                    source: source.into(),
                })?;
        }
        insert.end().await.map_err(|source| StorageError::InsertFailed {
            table: "abis",
            source: source.into(),
        })
    }
}
