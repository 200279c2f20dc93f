//! JSON-RPC client for the subset of the Ethereum JSON-RPC surface the
//! ingestor needs: fetching a block with full transactions, fetching logs
//! over a block range, and reading the chain head.

mod client;
mod types;

pub use client::RpcClient;
pub use types::{Block, Log, Transaction};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RpcClient {
        RpcClient::new(
            1,
            reqwest::Client::new(),
            server.uri().parse().unwrap(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn get_block_returns_none_on_null_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": null,
            })))
            .mount(&server)
            .await;

        let block = client(&server).get_block(100).await.unwrap();
        assert!(block.is_none());
    }

    #[tokio::test]
    async fn get_block_parses_hex_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "number": "0x64",
                    "hash": "0xabc",
                    "timestamp": "0x5f5e100",
                    "transactions": [{
                        "hash": "0xdeadbeef",
                        "from": "0xAAAA000000000000000000000000000000AAAA",
                        "to": null,
                        "value": "0x0",
                        "gasPrice": "0x3b9aca00",
                        "gas": "0x5208",
                        "input": "0x",
                    }],
                },
            })))
            .mount(&server)
            .await;

        let block = client(&server).get_block(100).await.unwrap().unwrap();
        assert_eq!(block.number, 100);
        assert_eq!(block.timestamp, 100_000_000);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].to, None);
        assert_eq!(block.transactions[0].gas, 21_000);
        assert_eq!(
            block.transactions[0].from,
            "0xaaaa000000000000000000000000000000aaaa"
        );
    }

    #[tokio::test]
    async fn rpc_error_object_surfaces_as_rpc_error() {
        use crate::error::RpcError;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32000, "message": "header not found"},
            })))
            .mount(&server)
            .await;

        let err = client(&server).get_block(100).await.unwrap_err();
        assert!(matches!(err, RpcError::Rpc { code: -32000, .. }));
    }

    #[tokio::test]
    async fn http_error_status_is_surfaced() {
        use crate::error::RpcError;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).get_block(100).await.unwrap_err();
        assert!(matches!(err, RpcError::Http(503)));
    }
}
