//! Errors for node queries.

use stackwatch_core::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    /// The node answered with a JSON-RPC error envelope.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The request never got an answer (connection, timeout, shutdown).
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// The node answered, but the result failed validation.
    #[error("malformed {method} response: {reason}")]
    MalformedResponse {
        method: &'static str,
        reason: String,
    },
}

impl NodeError {
    /// Classify a transport error raised while calling `method`.
    pub fn from_transport(method: &'static str, err: TransportError) -> Self {
        match err {
            TransportError::Rpc(e) => Self::Rpc {
                code: e.code,
                message: e.message,
            },
            TransportError::Deserialization(e) => Self::MalformedResponse {
                method,
                reason: e.to_string(),
            },
            other => Self::Transport(other),
        }
    }

    pub fn malformed(method: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            method,
            reason: reason.into(),
        }
    }

    /// Returns `true` if the data is unavailable because the node could not be
    /// reached, rather than because it answered badly.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackwatch_core::JsonRpcError;

    #[test]
    fn rpc_envelope_keeps_remote_message() {
        let e = NodeError::from_transport(
            "anvil_nodeInfo",
            TransportError::Rpc(JsonRpcError {
                code: -32601,
                message: "Method not found".into(),
                data: None,
            }),
        );
        assert_eq!(e.to_string(), "RPC error -32601: Method not found");
    }

    #[test]
    fn deserialization_becomes_malformed() {
        let json_err = serde_json::from_str::<u64>("\"x\"").unwrap_err();
        let e = NodeError::from_transport("eth_chainId", TransportError::Deserialization(json_err));
        assert!(matches!(e, NodeError::MalformedResponse { method: "eth_chainId", .. }));
    }

    #[test]
    fn connectivity_is_transport() {
        let e = NodeError::from_transport("eth_chainId", TransportError::Timeout { ms: 10 });
        assert!(e.is_transport());
    }
}
