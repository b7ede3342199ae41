//! Typed client for the handful of node methods stackwatch pulls.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use stackwatch_core::{hex, RpcTransport, TxHash};

use crate::error::NodeError;
use crate::types::{NodeIntrospection, TxOutcome};
use crate::wire::ReceiptWire;

/// Request/response queries against a single node.
///
/// Each method issues exactly one call. Failures are scoped to the call that
/// produced them; the client itself holds no state beyond the request id.
pub struct NodeClient<T> {
    transport: T,
    next_id: AtomicU64,
}

impl<T: RpcTransport> NodeClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call(&self, method: &'static str, params: Vec<Value>) -> Result<Value, NodeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.transport
            .call::<Value>(id, method, params)
            .await
            .map_err(|e| NodeError::from_transport(method, e))
    }

    /// `anvil_nodeInfo`: fork config, hardfork and gas environment.
    pub async fn node_info(&self) -> Result<NodeIntrospection, NodeError> {
        const METHOD: &str = "anvil_nodeInfo";
        let raw = self.call(METHOD, vec![]).await?;
        let info = NodeIntrospection::from_node_info(raw)
            .map_err(|reason| NodeError::malformed(METHOD, reason))?;
        tracing::debug!(
            url = %self.url(),
            block = info.current_block_number,
            forked = info.fork_config.is_some(),
            "node info"
        );
        Ok(info)
    }

    /// `eth_chainId`, parsed from its hex quantity.
    pub async fn chain_id(&self) -> Result<u32, NodeError> {
        const METHOD: &str = "eth_chainId";
        let raw = self.call(METHOD, vec![]).await?;
        let Value::String(s) = raw else {
            return Err(NodeError::malformed(METHOD, format!("expected hex string, got {raw}")));
        };
        let id = hex::parse_u64(&s)
            .map_err(|_| NodeError::malformed(METHOD, format!("invalid quantity {s:?}")))?;
        u32::try_from(id).map_err(|_| NodeError::malformed(METHOD, format!("chain id {id} exceeds u32")))
    }

    /// `eth_getTransactionReceipt`. `Ok(None)` while the receipt is not
    /// available yet.
    pub async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TxOutcome>, NodeError> {
        const METHOD: &str = "eth_getTransactionReceipt";
        let raw = self.call(METHOD, vec![Value::String(hash.to_string())]).await?;
        if raw.is_null() {
            return Ok(None);
        }
        let wire: ReceiptWire =
            serde_json::from_value(raw).map_err(|e| NodeError::malformed(METHOD, e.to_string()))?;
        wire.into_outcome(hash)
            .map(Some)
            .map_err(|reason| NodeError::malformed(METHOD, reason))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;
    use stackwatch_core::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, TransportError};

    use super::*;

    /// Answers each method with a canned result or error envelope.
    #[derive(Clone, Default)]
    pub(crate) struct MockNode {
        answers: Arc<Mutex<HashMap<String, Result<Value, JsonRpcError>>>>,
        pub(crate) calls: Arc<AtomicUsize>,
    }

    impl MockNode {
        pub(crate) fn answer(self, method: &str, result: Value) -> Self {
            self.answers.lock().unwrap().insert(method.into(), Ok(result));
            self
        }

        pub(crate) fn fail(self, method: &str, code: i64, message: &str) -> Self {
            self.answers.lock().unwrap().insert(
                method.into(),
                Err(JsonRpcError {
                    code,
                    message: message.into(),
                    data: None,
                }),
            );
            self
        }
    }

    #[async_trait]
    impl RpcTransport for MockNode {
        async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = self.answers.lock().unwrap().get(&req.method).cloned();
            match answer {
                Some(Ok(v)) => Ok(JsonRpcResponse {
                    jsonrpc: "2.0".into(),
                    id: req.id,
                    result: Some(v),
                    error: None,
                }),
                Some(Err(e)) => Ok(JsonRpcResponse {
                    jsonrpc: "2.0".into(),
                    id: req.id,
                    result: None,
                    error: Some(e),
                }),
                None => Err(TransportError::Http("connection refused".into())),
            }
        }

        fn url(&self) -> &str {
            "mock://node"
        }
    }

    #[tokio::test]
    async fn chain_id_parses_hex() {
        let client = NodeClient::new(MockNode::default().answer("eth_chainId", json!("0xa4b1")));
        assert_eq!(client.chain_id().await.unwrap(), 42161);
    }

    #[tokio::test]
    async fn chain_id_rejects_non_string_and_overflow() {
        let client = NodeClient::new(MockNode::default().answer("eth_chainId", json!(1)));
        assert!(matches!(
            client.chain_id().await,
            Err(NodeError::MalformedResponse { method: "eth_chainId", .. })
        ));

        let client =
            NodeClient::new(MockNode::default().answer("eth_chainId", json!("0x1ffffffff")));
        assert!(matches!(
            client.chain_id().await,
            Err(NodeError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn rpc_error_propagates_remote_message() {
        let client = NodeClient::new(MockNode::default().fail(
            "anvil_nodeInfo",
            -32601,
            "Method not found",
        ));
        match client.node_info().await {
            Err(NodeError::Rpc { code, message }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_reported_as_transport() {
        let client = NodeClient::new(MockNode::default());
        assert!(client.chain_id().await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn missing_receipt_is_none() {
        let client = NodeClient::new(
            MockNode::default().answer("eth_getTransactionReceipt", Value::Null),
        );
        let outcome = client
            .transaction_receipt(TxHash::repeat_byte(0x11))
            .await
            .unwrap();
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn malformed_call_does_not_affect_the_next_one() {
        let node = MockNode::default()
            .answer("anvil_nodeInfo", json!({"hardFork": 3}))
            .answer("eth_chainId", json!("0x7a69"));
        let client = NodeClient::new(node);

        assert!(matches!(
            client.node_info().await,
            Err(NodeError::MalformedResponse { method: "anvil_nodeInfo", .. })
        ));
        assert_eq!(client.chain_id().await.unwrap(), 31337);
    }
}
