//! Sourcify ABI resolution: rotating proxy pool, retry/backoff, TTL cache.

mod cache;
mod client;
mod types;

pub use client::SourcifyClient;
pub use types::VerificationStatus;
