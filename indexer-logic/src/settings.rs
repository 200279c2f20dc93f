//! Environment-driven configuration.
//!
//! The chain map (`CHAINS` + `RPC_URL_<id>`) needs to scan dynamically
//! named variables, which a static `config`-crate deserializer can't bind
//! to directly, so settings are assembled by hand rather than derived.
//! Everything that *can* be a plain struct still derives `Deserialize` so
//! it can be unit-tested without touching the environment.

use std::{collections::HashMap, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourcifySettings {
    pub proxy_urls: Vec<Url>,
    pub direct_url: Url,
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    pub max_retries: u32,
    #[serde(with = "duration_millis")]
    pub cache_ttl: Duration,
}

impl Default for SourcifySettings {
    fn default() -> Self {
        Self {
            proxy_urls: Vec::new(),
            direct_url: Url::parse("https://sourcify.dev/server").unwrap(),
            timeout: Duration::from_millis(30_000),
            max_retries: 3,
            cache_ttl: Duration::from_millis(86_400_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClickhouseSettings {
    pub url: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PipelineSettings {
    pub processor_concurrency: usize,
    pub batcher_concurrency: usize,
    pub batch_size: usize,
    #[serde(with = "duration_millis")]
    pub batch_timeout: Duration,
    pub abi_resolve_concurrency: usize,
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,
    #[serde(with = "duration_millis")]
    pub rpc_timeout: Duration,
    #[serde(with = "duration_millis")]
    pub restart_delay_cap: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            processor_concurrency: 10,
            batcher_concurrency: 5,
            batch_size: 100,
            batch_timeout: Duration::from_millis(1_000),
            abi_resolve_concurrency: 1,
            poll_interval: Duration::from_millis(1_000),
            rpc_timeout: Duration::from_millis(15_000),
            restart_delay_cap: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSettings {
    pub chain_id: u32,
    pub rpc_url: Url,
    pub start_block: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub chains: Vec<ChainSettings>,
    pub sourcify: SourcifySettings,
    pub clickhouse: ClickhouseSettings,
    pub pipeline: PipelineSettings,
}

impl Settings {
    /// Assembles settings from the process environment, failing fast on
    /// the first missing or malformed variable (spec: configuration
    /// errors are fatal at startup, naming the offending variable).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&std::env::vars().collect())
    }

    /// Same as [`Settings::from_env`] but reads from a plain map, so
    /// tests don't need to touch real process environment variables.
    pub fn from_source(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let start_block = optional_u64(env, "START_BLOCK")?.unwrap_or(0);
        let chains = parse_chains(env, start_block)?;

        let sourcify = SourcifySettings {
            proxy_urls: optional_url_list(env, "SOURCIFY_PROXY_URLS")?,
            direct_url: optional_url(env, "SOURCIFY_DIRECT_URL")?.unwrap_or_else(|| {
                Url::parse("https://sourcify.dev/server").expect("static url")
            }),
            timeout: Duration::from_millis(optional_u64(env, "SOURCIFY_TIMEOUT")?.unwrap_or(30_000)),
            max_retries: optional_u64(env, "SOURCIFY_MAX_RETRIES")?.unwrap_or(3) as u32,
            cache_ttl: Duration::from_millis(
                optional_u64(env, "SOURCIFY_CACHE_TTL")?.unwrap_or(86_400_000),
            ),
        };

        let clickhouse = ClickhouseSettings {
            url: env
                .get("CLICKHOUSE_URL")
                .cloned()
                .unwrap_or_else(|| "http://localhost:8123".to_string()),
            database: env
                .get("CLICKHOUSE_DATABASE")
                .cloned()
                .unwrap_or_else(|| "default".to_string()),
            user: env.get("CLICKHOUSE_USER").cloned(),
            password: env.get("CLICKHOUSE_PASSWORD").cloned(),
        };

        Ok(Self {
            chains,
            sourcify,
            clickhouse,
            pipeline: PipelineSettings::default(),
        })
    }
}

fn parse_chains(
    env: &HashMap<String, String>,
    start_block: u64,
) -> Result<Vec<ChainSettings>, ConfigError> {
    let raw = env
        .get("CHAINS")
        .or_else(|| env.get("SUPPORTED_CHAINS"))
        .ok_or_else(|| ConfigError::MissingVar("CHAINS".to_string()))?;

    let mut chains = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let chain_id: u32 = part.parse().map_err(|_| ConfigError::InvalidValue {
            var: "CHAINS".to_string(),
            reason: format!("'{part}' is not a valid chain id"),
        })?;
        let var = format!("RPC_URL_{chain_id}");
        let rpc_url = env
            .get(&var)
            .ok_or_else(|| ConfigError::MissingRpcUrl(chain_id))?;
        let rpc_url = Url::parse(rpc_url).map_err(|e| ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
        })?;
        chains.push(ChainSettings {
            chain_id,
            rpc_url,
            start_block,
        });
    }
    if chains.is_empty() {
        return Err(ConfigError::InvalidValue {
            var: "CHAINS".to_string(),
            reason: "no chain ids listed".to_string(),
        });
    }
    Ok(chains)
}

fn optional_u64(env: &HashMap<String, String>, var: &str) -> Result<Option<u64>, ConfigError> {
    match env.get(var) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                reason: format!("'{raw}' is not an integer"),
            }),
    }
}

fn optional_url(env: &HashMap<String, String>, var: &str) -> Result<Option<Url>, ConfigError> {
    match env.get(var) {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => Url::parse(raw).map(Some).map_err(|e| ConfigError::InvalidValue {
            var: var.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn optional_url_list(env: &HashMap<String, String>, var: &str) -> Result<Vec<Url>, ConfigError> {
    let Some(raw) = env.get(var) else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Url::parse(s).map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
