use thiserror::Error;

use crate::request::JsonRpcError;

/// Why a request to a node or wallet endpoint produced no usable result.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connect failure or non-2xx status.
    #[error("http: {0}")]
    Http(String),

    #[error("websocket: {0}")]
    WebSocket(String),

    /// The endpoint answered with an error member.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    #[error("no answer within {ms}ms")]
    Timeout { ms: u64 },

    /// `result` did not have the shape the caller asked for.
    #[error("unexpected result shape: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The connection task is gone; no further answers will arrive.
    #[error("transport closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Connectivity problems that a later attempt may not hit. An error member
    /// or a closed transport will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::WebSocket(_) | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_member_is_final() {
        let e = TransportError::Rpc(JsonRpcError::new(-32601, "Method not found"));
        assert!(!e.is_retryable());
        assert_eq!(e.to_string(), "RPC error -32601: Method not found");
    }

    #[test]
    fn connectivity_is_transient() {
        assert!(TransportError::Http("connection refused".into()).is_retryable());
        assert!(TransportError::WebSocket("reset".into()).is_retryable());
        assert!(TransportError::Timeout { ms: 30_000 }.is_retryable());
        assert!(!TransportError::Closed.is_retryable());
        assert_eq!(
            TransportError::Timeout { ms: 250 }.to_string(),
            "no answer within 250ms"
        );
    }
}
