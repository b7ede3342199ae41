//! The `RpcTransport` trait: the core abstraction for every JSON-RPC endpoint.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// The central async trait every RPC transport must implement.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
///
/// # Object Safety
/// [`call`](RpcTransport::call) is generic and therefore bound to
/// `Self: Sized`; the rest of the trait can be used as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request and return the raw response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Return the transport's identifier (URL or name).
    fn url(&self) -> &str;

    /// Convenience: call a method and deserialize the result.
    ///
    /// An error envelope becomes [`TransportError::Rpc`]; a `result` that does
    /// not match `T` becomes [`TransportError::Deserialization`].
    async fn call<T: DeserializeOwned>(
        &self,
        id: u64,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, TransportError>
    where
        Self: Sized,
    {
        let req = JsonRpcRequest::new(id, method, params);
        let resp = self.send(req).await?;
        let result = resp.into_result().map_err(TransportError::Rpc)?;
        serde_json::from_value(result).map_err(TransportError::Deserialization)
    }
}

#[async_trait]
impl<T: RpcTransport> RpcTransport for std::sync::Arc<T> {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        (**self).send(req).await
    }

    fn url(&self) -> &str {
        (**self).url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::JsonRpcError;

    struct Fixed(Result<Value, JsonRpcError>);

    #[async_trait]
    impl RpcTransport for Fixed {
        async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
            let id = req.id.as_number().unwrap_or(0);
            Ok(match &self.0 {
                Ok(v) => JsonRpcResponse::ok(id, v.clone()),
                Err(e) => JsonRpcResponse::failure(id, e.clone()),
            })
        }

        fn url(&self) -> &str {
            "mock://fixed"
        }
    }

    #[tokio::test]
    async fn call_deserializes_result() {
        let t = Fixed(Ok(Value::String("0x7a69".into())));
        let id: String = t.call(1, "eth_chainId", vec![]).await.unwrap();
        assert_eq!(id, "0x7a69");
    }

    #[tokio::test]
    async fn call_maps_error_envelope() {
        let t = Fixed(Err(JsonRpcError::new(-32000, "boom")));
        let err = t.call::<String>(1, "eth_chainId", vec![]).await.unwrap_err();
        assert!(matches!(err, TransportError::Rpc(e) if e.message == "boom"));
    }

    #[tokio::test]
    async fn call_maps_shape_mismatch() {
        let t = Fixed(Ok(serde_json::json!({"not": "a string"})));
        let err = t.call::<String>(1, "eth_chainId", vec![]).await.unwrap_err();
        assert!(matches!(err, TransportError::Deserialization(_)));
    }
}
