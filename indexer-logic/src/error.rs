//! Error taxonomy shared by the RPC client, Sourcify resolver, and storage
//! gateway. Grouped by how a caller should react, not by subsystem:
//! transient errors are worth retrying, authoritative negatives are not
//! errors at all from the pipeline's point of view, and protocol/shape
//! problems mean "store the row raw, don't retry."

use thiserror::Error;

/// Errors from `eth_getBlockByNumber` / `eth_getLogs`.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc error (code {code}): {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected http status {0}")]
    Http(u16),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    InvalidResponse(String),
}

/// Errors from the Sourcify resolver. `NotFound` and `NotVerified` are
/// authoritative negatives: the caller leaves the log undecoded rather
/// than treating them as failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourcifyError {
    #[error("no metadata for this address")]
    NotFound,
    #[error("contract is not verified")]
    NotVerified,
    #[error("rate limited")]
    RateLimited,
    #[error("request timed out")]
    Timeout,
    #[error("http error {0}")]
    Http(u16),
    #[error("invalid metadata")]
    InvalidMetadata,
    #[error("no abi found in metadata response")]
    NoAbiFound,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("no proxy or direct url configured")]
    MissingUpstream,
}

/// Errors from the storage gateway. Always fails the whole batch.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("insert into {table} failed: {source}")]
    InsertFailed {
        table: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Fail-fast configuration errors, raised at startup only.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
    #[error("no rpc url configured for chain {0}")]
    MissingRpcUrl(u32),
}
