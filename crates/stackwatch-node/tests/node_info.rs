//! Fixture-driven tests for `anvil_nodeInfo` validation.
//!
//! Each fixture under `fixtures/node/` is a raw `result` payload as an anvil
//! node returns it; the test serves it through a one-method transport and
//! checks what `NodeClient::node_info` makes of it.

use async_trait::async_trait;
use serde_json::Value;
use stackwatch_core::{JsonRpcRequest, JsonRpcResponse, RpcTransport, TransportError};
use stackwatch_node::{NodeClient, NodeError};

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures/node");
    p.push(name);
    p
}

fn load_fixture(name: &str) -> Value {
    let content = std::fs::read_to_string(fixture_path(name)).expect("fixture not found");
    serde_json::from_str(&content).expect("invalid fixture JSON")
}

struct Serve(Value);

#[async_trait]
impl RpcTransport for Serve {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        assert_eq!(req.method, "anvil_nodeInfo");
        Ok(JsonRpcResponse {
            jsonrpc: "2.0".into(),
            id: req.id,
            result: Some(self.0.clone()),
            error: None,
        })
    }

    fn url(&self) -> &str {
        "fixture://anvil"
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn forked_node_exposes_fork_config() {
    let client = NodeClient::new(Serve(load_fixture("node-info-fork.json")));
    let info = client.node_info().await.unwrap();

    assert_eq!(info.current_block_number, 0x121eac1);
    assert_eq!(info.hard_fork, "cancun");
    assert_eq!(info.environment.chain_id, 31337);
    assert_eq!(info.environment.gas_limit, 30_000_000);
    assert_eq!(info.environment.gas_price, 1_000_000_000);

    let fork = info.fork_config.as_ref().expect("fork config");
    assert_eq!(fork.fork_url, "https://eth.llamarpc.com");
    assert_eq!(fork.fork_block_number, 19_000_000);
    assert_eq!(fork.fork_retry_backoff, Some(1000));
    assert_eq!(info.fork_url(), Some("https://eth.llamarpc.com"));
}

#[tokio::test]
async fn local_node_with_null_fork_fields_is_not_a_fork() {
    let client = NodeClient::new(Serve(load_fixture("node-info-local.json")));
    let info = client.node_info().await.unwrap();

    assert_eq!(info.current_block_number, 42);
    assert_eq!(info.environment.base_fee, 1_000_000_000);
    assert_eq!(info.environment.gas_limit, 30_000_000);
    assert!(info.fork_config.is_none());
}

#[tokio::test]
async fn invalid_block_hash_is_malformed() {
    let client = NodeClient::new(Serve(load_fixture("node-info-malformed.json")));
    match client.node_info().await {
        Err(NodeError::MalformedResponse { method, .. }) => assert_eq!(method, "anvil_nodeInfo"),
        other => panic!("expected MalformedResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn fork_url_without_block_number_is_malformed() {
    let mut raw = load_fixture("node-info-fork.json");
    raw["forkConfig"]["forkBlockNumber"] = Value::Null;
    let client = NodeClient::new(Serve(raw));
    let err = client.node_info().await.unwrap_err();
    assert!(err.to_string().contains("forkBlockNumber"), "{err}");
}
