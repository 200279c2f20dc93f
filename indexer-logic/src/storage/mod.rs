//! Storage gateway: the single seam between the pipeline and the columnar
//! store. A trait so pipeline tests can run against an in-memory fake
//! instead of a live ClickHouse server.

mod gateway;

pub use gateway::{ClickhouseGateway, StorageGateway};

#[cfg(test)]
pub use gateway::test_support::InMemoryGateway;
