//! A [`WalletProvider`] reached over JSON-RPC, for wallets that expose a local
//! endpoint (desktop wallets such as ethui or Frame) instead of a browser
//! injection.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};
use stackwatch_core::{JsonRpcRequest, RpcTransport, TransportError};

use crate::provider::WalletProvider;

pub struct RpcWalletProvider<T> {
    transport: T,
    next_id: AtomicU64,
}

impl<T: RpcTransport> RpcWalletProvider<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }
}

/// Shape a transport failure the way an injected provider would throw it.
///
/// JSON-RPC error envelopes keep their `code`/`message`; anything else has no
/// provider error shape.
fn fault(err: TransportError) -> Value {
    match err {
        TransportError::Rpc(e) => json!({
            "code": e.code,
            "message": e.message,
            "data": e.data,
        }),
        other => Value::String(other.to_string()),
    }
}

#[async_trait]
impl<T: RpcTransport> WalletProvider for RpcWalletProvider<T> {
    async fn request(&self, method: &str, params: Value) -> Result<Value, Value> {
        let params = match params {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let resp = self
            .transport
            .send(JsonRpcRequest::new(id, method, params))
            .await
            .map_err(fault)?;
        resp.into_result().map_err(|e| fault(TransportError::Rpc(e)))
    }
}
